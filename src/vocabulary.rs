//! Fashion vocabulary
//!
//! Static lexicons of colors, fabrics, patterns, styles and embellishments,
//! matched against free text from model descriptions. Each entry has a
//! canonical term and the surface forms that count as a hit for it
//! ("charcoal" is reported as "grey", "sequinned" as "sequins").

use crate::types::Category;

/// One canonical term and the surface forms that count as a hit
#[derive(Debug, Clone, Copy)]
pub struct LexiconEntry {
    pub term: &'static str,
    pub variants: &'static [&'static str],
}

/// A named list of terms
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub name: &'static str,
    pub entries: &'static [LexiconEntry],
}

impl Lexicon {
    /// Canonical terms found in `text`, in lexicon order, each at most once
    ///
    /// Longer phrases claim their span first, so "navy blue" counts as navy
    /// and not also as blue.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        let mut variants: Vec<(usize, &str)> = self
            .entries
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| entry.variants.iter().map(move |v| (index, *v)))
            .collect();
        variants.sort_by_key(|(_, variant)| std::cmp::Reverse(variant.len()));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut hits = vec![false; self.entries.len()];
        for (index, variant) in variants {
            for (start, end) in phrase_spans(&haystack, variant) {
                if claimed.iter().all(|&(s, e)| end <= s || start >= e) {
                    claimed.push((start, end));
                    hits[index] = true;
                }
            }
        }

        self.entries
            .iter()
            .zip(hits)
            .filter(|(_, hit)| *hit)
            .map(|(entry, _)| entry.term.to_string())
            .collect()
    }

    /// Canonical terms, comma separated, for prompt hints
    pub fn term_list(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.term)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Canonical term for a single label, if the label is one of our variants
    pub fn canonicalize(&self, label: &str) -> Option<&'static str> {
        let needle = label.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.term == needle || entry.variants.contains(&needle.as_str()))
            .map(|entry| entry.term)
    }
}

/// Case-sensitive phrase search on an already lowercased haystack, requiring
/// non-alphanumeric characters (or text edges) on both sides of the match
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    phrase_spans(haystack, phrase).next().is_some()
}

/// Byte ranges of the word-bounded occurrences of `phrase`
fn phrase_spans<'a>(haystack: &'a str, phrase: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    haystack
        .match_indices(phrase)
        .filter(move |_| !phrase.is_empty())
        .map(|(start, matched)| (start, start + matched.len()))
        .filter(move |&(start, end)| {
            let before_ok = haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            before_ok && after_ok
        })
}

macro_rules! entry {
    ($term:expr, [$($variant:expr),* $(,)?]) => {
        LexiconEntry { term: $term, variants: &[$term, $($variant),*] }
    };
}

pub const COLORS: Lexicon = Lexicon {
    name: "colors",
    entries: &[
        entry!("black", ["jet black", "onyx"]),
        entry!("white", ["optic white", "snow"]),
        entry!("ivory", ["cream", "off-white", "off white", "ecru"]),
        entry!("grey", ["gray", "charcoal", "heather grey", "heather gray", "slate"]),
        entry!("navy", ["navy blue", "midnight blue"]),
        entry!("blue", ["cobalt", "royal blue", "sky blue", "denim blue", "teal"]),
        entry!("red", ["crimson", "scarlet", "cherry"]),
        entry!("burgundy", ["maroon", "wine", "oxblood", "bordeaux"]),
        entry!("pink", ["blush", "fuchsia", "rose", "magenta", "hot pink"]),
        entry!("purple", ["lavender", "violet", "lilac", "plum", "mauve"]),
        entry!("green", ["olive", "emerald", "sage", "forest green", "mint"]),
        entry!("yellow", ["mustard", "lemon", "canary"]),
        entry!("orange", ["rust", "burnt orange", "tangerine", "coral"]),
        entry!("brown", ["chocolate", "tan", "camel", "cognac", "chestnut"]),
        entry!("beige", ["nude", "taupe", "sand", "khaki", "stone"]),
        entry!("gold", ["golden", "metallic gold"]),
        entry!("silver", ["metallic silver", "gunmetal"]),
        entry!("multicolor", ["multicolour", "multi-color", "multi-colour", "rainbow"]),
    ],
};

pub const FABRICS: Lexicon = Lexicon {
    name: "fabrics",
    entries: &[
        entry!("cotton", ["organic cotton", "poplin", "seersucker"]),
        entry!("linen", []),
        entry!("silk", ["silky", "charmeuse", "crepe de chine"]),
        entry!("satin", ["sateen"]),
        entry!("wool", ["woolen", "woollen", "merino", "wool blend"]),
        entry!("cashmere", []),
        entry!("denim", ["jean", "chambray"]),
        entry!("leather", ["faux leather", "vegan leather", "patent leather", "lambskin"]),
        entry!("suede", ["nubuck"]),
        entry!("polyester", ["poly"]),
        entry!("nylon", []),
        entry!("spandex", ["elastane", "lycra"]),
        entry!("viscose", ["rayon", "modal", "lyocell", "tencel"]),
        entry!("chiffon", ["georgette"]),
        entry!("tulle", ["mesh", "netting"]),
        entry!("velvet", ["velour", "velvety"]),
        entry!("jersey", ["knit jersey"]),
        entry!("knit", ["knitted", "ribbed knit", "cable knit"]),
        entry!("tweed", ["boucle", "bouclé"]),
        entry!("corduroy", ["cord"]),
        entry!("fleece", ["sherpa"]),
        entry!("faux fur", ["fur", "shearling"]),
        entry!("organza", []),
        entry!("crepe", []),
    ],
};

pub const PATTERNS: Lexicon = Lexicon {
    name: "patterns",
    entries: &[
        entry!("striped", ["stripe", "stripes", "pinstripe", "pinstriped", "breton"]),
        entry!("plaid", ["tartan", "checked", "checkered", "gingham", "windowpane"]),
        entry!("floral", ["flowers", "flower print", "botanical", "ditsy"]),
        entry!("polka dot", ["polka dots", "polka-dot", "dotted", "spotted"]),
        entry!("animal print", ["leopard", "zebra", "snakeskin", "snake print", "cheetah", "tiger print"]),
        entry!("houndstooth", ["dogtooth"]),
        entry!("paisley", []),
        entry!("geometric", ["chevron", "argyle"]),
        entry!("camouflage", ["camo"]),
        entry!("tie-dye", ["tie dye", "tie-dyed"]),
        entry!("abstract", ["abstract print"]),
        entry!("solid", ["plain", "solid color", "solid colour"]),
    ],
};

pub const STYLES: Lexicon = Lexicon {
    name: "styles",
    entries: &[
        entry!("casual", ["everyday", "relaxed"]),
        entry!("formal", ["black tie", "evening wear", "eveningwear"]),
        entry!("business", ["office", "workwear", "business casual", "tailored"]),
        entry!("bohemian", ["boho", "boho-chic"]),
        entry!("minimalist", ["minimal", "clean lines"]),
        entry!("streetwear", ["street style", "urban"]),
        entry!("vintage", ["retro", "throwback"]),
        entry!("romantic", ["feminine", "delicate"]),
        entry!("preppy", ["collegiate"]),
        entry!("edgy", ["grunge", "punk", "rocker"]),
        entry!("sporty", ["athletic", "athleisure"]),
        entry!("elegant", ["sophisticated", "refined"]),
        entry!("classic", ["timeless"]),
        entry!("glamorous", ["glam", "red carpet", "party"]),
    ],
};

/// Decorative garment features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbellishmentKind {
    Sequins,
    Beading,
    Embroidery,
    Lace,
    Rhinestones,
    Pearls,
    Appliques,
    Ruffles,
    Fringe,
    Studs,
    Feathers,
    Bows,
}

pub const EMBELLISHMENTS: Lexicon = Lexicon {
    name: "embellishments",
    entries: &[
        entry!("sequins", ["sequin", "sequined", "sequinned", "paillette", "paillettes"]),
        entry!("beading", ["bead", "beads", "beaded", "beadwork"]),
        entry!("embroidery", ["embroidered", "embroideries", "needlework"]),
        entry!("lace", ["lacy", "lace trim", "lace-trimmed", "guipure"]),
        entry!("rhinestones", ["rhinestone", "diamante", "crystals", "crystal-embellished", "strass"]),
        entry!("pearls", ["pearl", "pearl-embellished", "faux pearls"]),
        entry!("appliques", ["applique", "appliqué", "appliqués", "appliqued", "appliquéd"]),
        entry!("ruffles", ["ruffle", "ruffled", "frill", "frills", "frilled", "flounce"]),
        entry!("fringe", ["fringed", "tassel", "tassels", "tasseled"]),
        entry!("studs", ["stud", "studded", "rivets", "spikes"]),
        entry!("feathers", ["feather", "feathered", "marabou", "ostrich"]),
        entry!("bows", ["bow", "bow detail", "bow-embellished"]),
    ],
};

impl EmbellishmentKind {
    pub const ALL: [EmbellishmentKind; 12] = [
        EmbellishmentKind::Sequins,
        EmbellishmentKind::Beading,
        EmbellishmentKind::Embroidery,
        EmbellishmentKind::Lace,
        EmbellishmentKind::Rhinestones,
        EmbellishmentKind::Pearls,
        EmbellishmentKind::Appliques,
        EmbellishmentKind::Ruffles,
        EmbellishmentKind::Fringe,
        EmbellishmentKind::Studs,
        EmbellishmentKind::Feathers,
        EmbellishmentKind::Bows,
    ];

    /// Canonical term in `EMBELLISHMENTS`
    pub fn term(&self) -> &'static str {
        match self {
            EmbellishmentKind::Sequins => "sequins",
            EmbellishmentKind::Beading => "beading",
            EmbellishmentKind::Embroidery => "embroidery",
            EmbellishmentKind::Lace => "lace",
            EmbellishmentKind::Rhinestones => "rhinestones",
            EmbellishmentKind::Pearls => "pearls",
            EmbellishmentKind::Appliques => "appliques",
            EmbellishmentKind::Ruffles => "ruffles",
            EmbellishmentKind::Fringe => "fringe",
            EmbellishmentKind::Studs => "studs",
            EmbellishmentKind::Feathers => "feathers",
            EmbellishmentKind::Bows => "bows",
        }
    }

    pub fn from_term(term: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.term() == term)
    }
}

/// Category cue words, checked in order. More specific categories come
/// first so "dress shoes" reads as shoes and "shirt dress" as a dress.
const CATEGORY_CUES: &[(Category, &[&str])] = &[
    (Category::Shoes, &["shoes", "shoe", "sneakers", "boots", "heels", "pumps", "sandals", "loafers", "flats", "mules"]),
    (Category::Bags, &["bag", "handbag", "purse", "tote", "clutch", "backpack", "crossbody"]),
    (Category::Jewelry, &["necklace", "earrings", "bracelet", "ring", "brooch", "watch"]),
    (Category::Swimwear, &["swimsuit", "bikini", "swim trunks", "one-piece"]),
    (Category::Dresses, &["dress", "gown", "jumpsuit", "romper", "playsuit"]),
    (Category::Outerwear, &["coat", "jacket", "blazer", "parka", "trench", "puffer", "cape"]),
    (Category::Bottoms, &["jeans", "pants", "trousers", "skirt", "shorts", "leggings", "culottes"]),
    (Category::Activewear, &["sports bra", "joggers", "track pants", "yoga"]),
    (Category::Loungewear, &["pajamas", "pyjamas", "robe", "nightgown"]),
    (Category::Underwear, &["bra", "briefs", "boxers", "lingerie", "socks"]),
    (Category::Tops, &["shirt", "t-shirt", "tee", "blouse", "sweater", "cardigan", "hoodie", "top", "camisole", "polo", "turtleneck"]),
    (Category::Accessories, &["belt", "scarf", "hat", "cap", "sunglasses", "gloves", "tie"]),
];

/// First category whose cue words appear in `text`
pub fn category_from_text(text: &str) -> Option<Category> {
    let haystack = text.to_lowercase();
    CATEGORY_CUES
        .iter()
        .find(|(_, cues)| cues.iter().any(|cue| contains_phrase(&haystack, cue)))
        .map(|(category, _)| *category)
}
