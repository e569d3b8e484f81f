//! Name-pattern rules for classification and description text.
//!
//! Both tables are ordered and evaluated top to bottom; the first match wins.
//! Order is part of the output contract: `"Sprocket 219 chain Z10"` is a
//! sprocket because the sprocket rule precedes the chain rule, and moving a
//! rule changes the catalog the next import produces.

pub use kartsync_core::render_template;
use regex::Regex;

/// Tests a product name.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any of the needles occurs in the name, ignoring case. Needles are
    /// stored lowercased.
    Contains(Vec<String>),
    Regex(Regex),
}

impl Matcher {
    #[must_use]
    pub fn contains(needles: &[&str]) -> Self {
        Self::Contains(needles.iter().map(|n| n.to_lowercase()).collect())
    }

    /// Compiles `pattern` case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(Regex::new(&format!("(?i){pattern}"))?))
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Contains(needles) => {
                let lowered = name.to_lowercase();
                needles.iter().any(|n| lowered.contains(n.as_str()))
            }
            Self::Regex(re) => re.is_match(name),
        }
    }
}

/// One row of the rule table.
///
/// `category` and `subcategory` override the import's defaults when set.
/// `description` is a template; see [`render_template`].
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: String,
}

/// Ordered list of [`Rule`]s with a fallback template for unmatched names.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub rules: Vec<Rule>,
    pub fallback: String,
}

pub const GENERIC_DESCRIPTION: &str =
    "{name} from {brand}. Genuine {category} part for racing karts, checked for fit and finish.";

/// `(needles, subcategory, description)`; listed most specific first.
const PART_RULES: &[(&[&str], &str, &str)] = &[
    (
        &["brake pad", "fékbetét"],
        "brake-pads",
        "{name}: {brand} brake pads for consistent bite lap after lap.",
    ),
    (
        &["brake disc", "féktárcsa"],
        "brake-discs",
        "{name}: {brand} brake disc machined for even pad wear.",
    ),
    (
        &["sprocket", "lánckerék"],
        "sprockets",
        "{name}: {brand} rear sprocket for fine-tuning your gearing.",
    ),
    (
        &["chain", "lánc"],
        "chains",
        "{name}: {brand} kart chain for reliable drive at high revs.",
    ),
    (
        &["tyre", "tire", "gumi"],
        "tyres",
        "{name}: {brand} kart tyre with predictable grip and wear.",
    ),
    (
        &["piston", "dugattyú"],
        "pistons",
        "{name}: {brand} piston built to factory tolerances.",
    ),
    (
        &["spark plug", "gyertya"],
        "spark-plugs",
        "{name}: {brand} spark plug for a clean, strong spark.",
    ),
    (
        &["carburettor", "carburetor", "karburátor"],
        "carburettors",
        "{name}: {brand} carburettor for precise fuelling.",
    ),
    (
        &["bearing", "csapágy"],
        "bearings",
        "{name}: {brand} bearing for low-friction rotation.",
    ),
    (
        &["axle", "tengely"],
        "axles",
        "{name}: {brand} rear axle for a tuned chassis response.",
    ),
    (
        &["steering wheel", "kormány"],
        "steering",
        "{name}: {brand} steering wheel with a secure grip.",
    ),
    (
        &["seat", "ülés"],
        "seats",
        "{name}: {brand} kart seat for a firm, supportive driving position.",
    ),
];

impl RuleTable {
    #[must_use]
    pub fn new(rules: Vec<Rule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// The go-kart parts vocabulary used by storefront imports.
    ///
    /// Data loggers are reclassified into `electronics` regardless of the
    /// batch category; every other rule only sets a subcategory.
    #[must_use]
    pub fn go_kart_default() -> Self {
        let mut rules = vec![Rule {
            matcher: Matcher::contains(&["mychron", "alfano", "data logger", "datalogger"]),
            category: Some("electronics".to_owned()),
            subcategory: Some("data-loggers".to_owned()),
            description: "{name}: {brand} data logger for lap times, RPM and temperatures."
                .to_owned(),
        }];
        rules.extend(PART_RULES.iter().map(|(needles, sub, description)| Rule {
            matcher: Matcher::contains(needles),
            category: None,
            subcategory: Some((*sub).to_owned()),
            description: (*description).to_owned(),
        }));
        Self::new(rules, GENERIC_DESCRIPTION)
    }

    /// First rule whose matcher accepts `name`.
    #[must_use]
    pub fn first_match(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matcher.matches(name))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::go_kart_default()
    }
}

/// Ordered brand vocabulary: `(canonical name, aliases)`.
///
/// Aliases match whole words so short names like `"KG"` do not fire on
/// `"5kg"`.
#[derive(Debug, Clone)]
pub struct BrandTable {
    brands: Vec<(String, Vec<String>)>,
}

const KART_BRANDS: &[(&str, &[&str])] = &[
    ("Tony Kart", &["tony kart", "tonykart"]),
    ("Kart Republic", &["kart republic", "kr"]),
    ("Rotax", &["rotax"]),
    ("IAME", &["iame", "x30", "parilla"]),
    ("TM Racing", &["tm racing", "tm kz"]),
    ("Vortex", &["vortex"]),
    ("CRG", &["crg"]),
    ("OTK", &["otk"]),
    ("Birel", &["birel", "birel art"]),
    ("Praga", &["praga"]),
    ("Sodi", &["sodi", "sodikart"]),
    ("Exprit", &["exprit"]),
    ("KG", &["kg"]),
    ("Freeline", &["freeline"]),
    ("MyChron", &["mychron", "aim"]),
    ("Alfano", &["alfano"]),
    ("Bridgestone", &["bridgestone"]),
    ("Vega", &["vega"]),
    ("MG", &["mg tires", "mg tyres"]),
    ("LeCont", &["lecont", "le cont"]),
    ("Komet", &["komet"]),
    ("Dellorto", &["dellorto", "dell'orto"]),
    ("Tillotson", &["tillotson"]),
    ("NGK", &["ngk"]),
    ("Denso", &["denso"]),
    ("Regina", &["regina"]),
    ("DID", &["d.i.d", "did chain", "did 219"]),
];

impl BrandTable {
    #[must_use]
    pub fn new(brands: &[(&str, &[&str])]) -> Self {
        Self {
            brands: brands
                .iter()
                .map(|(name, aliases)| {
                    (
                        (*name).to_owned(),
                        aliases.iter().map(|a| word_key(a)).collect(),
                    )
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn kart_default() -> Self {
        Self::new(KART_BRANDS)
    }

    /// Canonical name of the first brand with an alias in `name`.
    #[must_use]
    pub fn detect(&self, name: &str) -> Option<&str> {
        let haystack = word_key(name);
        self.brands
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| haystack.contains(a.as_str())))
            .map(|(brand, _)| brand.as_str())
    }
}

impl Default for BrandTable {
    fn default() -> Self {
        Self::kart_default()
    }
}

/// Lowercases, turns every non-alphanumeric run into one space and pads with
/// spaces, so `contains(" kg ")` is a whole-word test.
fn word_key(text: &str) -> String {
    let mut out = String::from(" ");
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c != '\'' && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    if !out.ends_with(' ') {
        out.push(' ');
    }
    out
}
