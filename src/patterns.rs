// ABOUTME: Static pattern library mapping ingredient text tokens to nutrients
// ABOUTME: Fortification regexes, ultra-processed keyword tables, and primary-source lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Nutrient Pattern Library
//!
//! Static configuration created once per process: fortification regexes with
//! strength tiers and antioxidant-exclusion flags, the ultra-processed
//! keyword and marker tables the classifier scans, and the curated
//! whole-food primary-source lists the validator consults.
//!
//! The single pattern table is shared by the evidence-tiered validator and
//! the deterministic fallback parser so the two paths cannot drift apart.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::models::{NutrientId, NutrientPattern, StrengthTier};

// ============================================================================
// Fortification Patterns
// ============================================================================

/// Shorthand for pattern table entries
const fn p(
    pattern: &'static str,
    nutrient: NutrientId,
    strength: StrengthTier,
    requires_explicit_context: bool,
) -> NutrientPattern {
    NutrientPattern {
        pattern,
        nutrient,
        strength,
        requires_explicit_context,
    }
}

/// Fortification pattern table.
///
/// Patterns flagged `requires_explicit_context` only count when the
/// nutrient's explicit name also appears in the ingredient text: ascorbic
/// acid and tocopherols are routinely added as antioxidants, not nutrients.
pub static FORTIFICATION_PATTERNS: &[NutrientPattern] = &[
    // Vitamin A
    p(r"vitamin\s+a\b", NutrientId::VitaminA, StrengthTier::Strong, false),
    p(r"retinyl\s+(acetate|palmitate)", NutrientId::VitaminA, StrengthTier::Strong, false),
    p(r"\bretinol\b", NutrientId::VitaminA, StrengthTier::Moderate, false),
    p(r"beta[\s-]?carotene", NutrientId::VitaminA, StrengthTier::Moderate, false),
    // B vitamins
    p(r"vitamin\s+b1\b", NutrientId::VitaminB1, StrengthTier::Strong, false),
    p(r"thiamin(e)?\b", NutrientId::VitaminB1, StrengthTier::Strong, false),
    p(r"thiamine?\s+(mononitrate|hydrochloride)", NutrientId::VitaminB1, StrengthTier::Strong, false),
    p(r"vitamin\s+b2\b", NutrientId::VitaminB2, StrengthTier::Strong, false),
    p(r"\briboflavin\b", NutrientId::VitaminB2, StrengthTier::Strong, false),
    p(r"vitamin\s+b3\b", NutrientId::VitaminB3, StrengthTier::Strong, false),
    p(r"\bniacin(amide)?\b", NutrientId::VitaminB3, StrengthTier::Strong, false),
    p(r"\bnicotinamide\b", NutrientId::VitaminB3, StrengthTier::Strong, false),
    p(r"vitamin\s+b5\b", NutrientId::VitaminB5, StrengthTier::Strong, false),
    p(r"pantothenic\s+acid", NutrientId::VitaminB5, StrengthTier::Strong, false),
    p(r"(calcium\s+)?pantothenate", NutrientId::VitaminB5, StrengthTier::Strong, false),
    p(r"vitamin\s+b6\b", NutrientId::VitaminB6, StrengthTier::Strong, false),
    p(r"pyridoxine(\s+hydrochloride)?", NutrientId::VitaminB6, StrengthTier::Strong, false),
    p(r"vitamin\s+b7\b", NutrientId::VitaminB7, StrengthTier::Strong, false),
    p(r"\bbiotin\b", NutrientId::VitaminB7, StrengthTier::Strong, false),
    p(r"folic\s+acid", NutrientId::Folate, StrengthTier::Strong, false),
    p(r"\bfolate\b", NutrientId::Folate, StrengthTier::Strong, false),
    p(r"\bfolacin\b", NutrientId::Folate, StrengthTier::Moderate, false),
    p(r"vitamin\s+b12\b", NutrientId::VitaminB12, StrengthTier::Strong, false),
    p(r"(cyano|methyl|hydroxo)?cobalamin\b", NutrientId::VitaminB12, StrengthTier::Strong, false),
    // Vitamin C: explicit mention is strong evidence; ascorbic acid / E300 is
    // antioxidant use unless "vitamin c" also appears (the exclusion rule)
    p(r"vitamin\s+c\b", NutrientId::VitaminC, StrengthTier::Strong, false),
    p(r"ascorbic\s+acid", NutrientId::VitaminC, StrengthTier::Moderate, true),
    p(r"sodium\s+ascorbate", NutrientId::VitaminC, StrengthTier::Moderate, true),
    p(r"\be300\b", NutrientId::VitaminC, StrengthTier::Trace, true),
    // Vitamin D
    p(r"vitamin\s+d[23]?\b", NutrientId::VitaminD, StrengthTier::Strong, false),
    p(r"\bcholecalciferol\b", NutrientId::VitaminD, StrengthTier::Strong, false),
    p(r"\bergocalciferol\b", NutrientId::VitaminD, StrengthTier::Strong, false),
    // Vitamin E: tocopherols are antioxidant use unless "vitamin e" appears
    p(r"vitamin\s+e\b", NutrientId::VitaminE, StrengthTier::Strong, false),
    p(r"tocopher(ol|yl)s?\b", NutrientId::VitaminE, StrengthTier::Moderate, true),
    p(r"\be30[6-9]\b", NutrientId::VitaminE, StrengthTier::Trace, true),
    // Vitamin K
    p(r"vitamin\s+k[12]?\b", NutrientId::VitaminK, StrengthTier::Strong, false),
    p(r"\bphylloquinone\b", NutrientId::VitaminK, StrengthTier::Strong, false),
    p(r"\bmenaquinone\b", NutrientId::VitaminK, StrengthTier::Strong, false),
    // Minerals. Plain names match: outside fortification declarations they
    // essentially never appear in ingredient lists. Potassium is the
    // exception (potassium sorbate is a preservative) so only salt forms
    // count there.
    p(r"\bcalcium\b", NutrientId::Calcium, StrengthTier::Moderate, false),
    p(r"calcium\s+(carbonate|citrate|phosphate|lactate)", NutrientId::Calcium, StrengthTier::Strong, false),
    p(r"\biron\b", NutrientId::Iron, StrengthTier::Strong, false),
    p(r"ferrous\s+(sulph?ate|fumarate|gluconate)", NutrientId::Iron, StrengthTier::Strong, false),
    p(r"ferric\s+(pyrophosphate|orthophosphate)", NutrientId::Iron, StrengthTier::Strong, false),
    p(r"\bmagnesium\b", NutrientId::Magnesium, StrengthTier::Moderate, false),
    p(r"magnesium\s+(oxide|citrate|carbonate)", NutrientId::Magnesium, StrengthTier::Strong, false),
    p(r"\bzinc\b", NutrientId::Zinc, StrengthTier::Moderate, false),
    p(r"zinc\s+(oxide|sulph?ate|citrate)", NutrientId::Zinc, StrengthTier::Strong, false),
    p(r"\biodine\b", NutrientId::Iodine, StrengthTier::Moderate, false),
    p(r"potassium\s+(iodide|iodate)", NutrientId::Iodine, StrengthTier::Strong, false),
    p(r"potassium\s+(chloride|citrate|gluconate)", NutrientId::Potassium, StrengthTier::Strong, false),
    p(r"\bselenium\b", NutrientId::Selenium, StrengthTier::Moderate, false),
    p(r"sodium\s+selenite", NutrientId::Selenium, StrengthTier::Strong, false),
    // Omega-3
    p(r"omega[\s-]?3", NutrientId::Omega3, StrengthTier::Strong, false),
    p(r"\b(dha|epa)\b", NutrientId::Omega3, StrengthTier::Strong, false),
    p(r"(fish|algal)\s+oil", NutrientId::Omega3, StrengthTier::Moderate, false),
];

static COMPILED_PATTERNS: OnceLock<Vec<(Regex, &'static NutrientPattern)>> = OnceLock::new();

/// Fortification patterns compiled to case-insensitive regexes.
///
/// Compiled once per process. Entries that fail to compile are dropped with a
/// warning rather than poisoning the whole table.
pub fn compiled_fortification_patterns() -> &'static [(Regex, &'static NutrientPattern)] {
    COMPILED_PATTERNS.get_or_init(|| {
        FORTIFICATION_PATTERNS
            .iter()
            .filter_map(|entry| match Regex::new(&format!("(?i){}", entry.pattern)) {
                Ok(regex) => Some((regex, entry)),
                Err(e) => {
                    warn!(pattern = entry.pattern, error = %e, "Dropping unparseable fortification pattern");
                    None
                }
            })
            .collect()
    })
}

// ============================================================================
// Classifier Tables
// ============================================================================

/// Ultra-processed brand/category keywords checked against the food name.
///
/// A match classifies the food ultra-processed immediately. Mostly UK-market
/// confectionery, snacks, sugary drinks, and fast-food items.
pub static ULTRA_PROCESSED_KEYWORDS: &[&str] = &[
    // Confectionery brands
    "revels", "maltesers", "minstrels", "snickers", "mars bar", "milky way", "twix", "bounty",
    "kitkat", "kit kat", "smarties", "m&m", "skittles", "starburst", "haribo", "wine gums",
    "jelly babies", "jelly beans", "fruit pastilles", "toblerone", "ferrero", "aero", "wispa",
    "cadbury flake", "twirl", "double decker", "crunchie", "curly wurly", "fudge bar",
    "dairy milk", "galaxy", "ripple", "buttons", "milkybar", "yorkie", "toffee crisp", "rolo",
    "munchies", "lion bar", "drifter", "caramac", "turkish delight",
    // Generic confectionery
    "chocolate bar", "candy", "sweets", "toffee", "nougat", "fudge", "bonbon", "liquorice",
    "marshmallow", "caramel bar", "pick n mix", "gummy", "lollipop", "sherbet", "chewing gum",
    "bubblegum", "praline", "truffle box",
    // Biscuits and cakes
    "biscuit", "cookie", "digestive", "hobnob", "bourbon cream", "custard cream", "jaffa cake",
    "shortbread", "wafer", "oreo", "cake", "cupcake", "muffin", "brownie", "doughnut", "donut",
    "swiss roll", "battenberg", "eclair", "danish pastry", "croissant", "pain au chocolat",
    "mince pie", "flapjack", "rocky road", "millionaire shortbread", "viennese whirl",
    // Crisps and snacks
    "crisps", "potato chips", "pringles", "doritos", "wotsits", "quavers", "monster munch",
    "skips", "hula hoops", "cheetos", "tortilla chips", "pork scratchings", "pretzels",
    "cheese puffs", "sweet popcorn", "mccoys", "nik naks", "space raiders", "frazzles",
    // Ice cream and desserts
    "ice cream", "choc ice", "magnum", "cornetto", "viennetta", "screwball", "ice lolly",
    "frozen dessert", "angel delight", "trifle mix",
    // Sugary drinks
    "cola", "lemonade", "fanta", "sprite", "irn bru", "dr pepper", "energy drink", "red bull",
    "monster energy", "fruit squash", "milkshake", "frappuccino", "slush", "tango",
    // Fast food
    "burger", "cheeseburger", "hot dog", "chicken nuggets", "fish fingers", "fries",
    "onion rings", "frozen pizza", "doner kebab", "fried chicken", "corn dog",
    "turkey twizzlers", "potato waffles", "pot noodle", "instant noodles", "instant ramen",
    // Processed condiments and misc
    "ketchup", "mayonnaise", "salad cream", "squeezy cheese", "cheese string", "spam",
    "instant mash", "gravy granules", "custard powder", "jelly cubes", "sandwich spread",
];

/// Ultra-processed marker ingredients scanned in the joined ingredient text.
///
/// Three or more distinct markers classify a food ultra-processed (threshold
/// is `ClassifierConfig::ultra_processed_marker_threshold`).
pub static ULTRA_PROCESSED_MARKERS: &[&str] = &[
    "glucose syrup",
    "glucose-fructose syrup",
    "fructose syrup",
    "high fructose corn syrup",
    "corn syrup",
    "golden syrup",
    "invert sugar",
    "dextrose",
    "maltodextrin",
    "hydrogenated",
    "partially hydrogenated",
    "palm kernel oil",
    "cocoa butter",
    "cocoa mass",
    "cocoa solids",
    "emulsifier",
    "soy lecithin",
    "soya lecithin",
    "sunflower lecithin",
    "e471",
    "mono- and diglycerides",
    "modified starch",
    "modified maize starch",
    "modified corn starch",
    "stabiliser",
    "stabilizer",
    "thickener",
    "humectant",
    "flavouring",
    "flavoring",
    "artificial flavour",
    "artificial flavor",
    "aspartame",
    "acesulfame",
    "sucralose",
    "saccharin",
    "monosodium glutamate",
    "anti-caking agent",
    "colour:",
    "color:",
];

/// Fortification-declaration markers; their presence classifies a food as
/// fortified when no ultra-processed rule fired first.
pub static FORTIFICATION_DECLARATIONS: &[&str] =
    &["fortified", "vitamins:", "minerals:", "added vitamins"];

/// First ingredients that never qualify a food as a whole-food primary source
pub static TRIVIAL_INGREDIENTS: &[&str] = &["water", "sugar", "salt", "oil"];

// ============================================================================
// Whole-Food Primary Sources
// ============================================================================

/// Curated whole-food primary sources per nutrient.
///
/// Matched by substring against the food name or its dominant ingredient.
/// Stemmed where plural forms are common ("strawberr" covers strawberry and
/// strawberries).
pub static PRIMARY_SOURCES: &[(NutrientId, &[&str])] = &[
    (
        NutrientId::VitaminC,
        &[
            "orange", "lemon", "lime", "grapefruit", "kiwi", "strawberr", "blackcurrant",
            "bell pepper", "red pepper", "broccoli", "brussels sprout", "papaya", "guava",
        ],
    ),
    (
        NutrientId::Calcium,
        &["milk", "yogurt", "yoghurt", "cheese", "kefir", "fromage frais"],
    ),
    (
        NutrientId::VitaminD,
        &["salmon", "mackerel", "sardine", "herring", "trout", "egg yolk"],
    ),
    (
        NutrientId::VitaminB12,
        &["salmon", "mackerel", "sardine", "beef", "lamb", "liver", "egg", "milk"],
    ),
    (
        NutrientId::Omega3,
        &["salmon", "mackerel", "sardine", "herring", "anchov", "walnut", "flaxseed", "chia"],
    ),
    (
        NutrientId::Iron,
        &["beef", "liver", "lentil", "spinach", "kidney bean", "venison"],
    ),
    (
        NutrientId::Folate,
        &["spinach", "lentil", "chickpea", "asparagus", "avocado", "edamame"],
    ),
    (NutrientId::Potassium, &["banana", "potato", "avocado", "coconut water"]),
    (
        NutrientId::Magnesium,
        &["almond", "cashew", "pumpkin seed", "spinach", "edamame"],
    ),
    (NutrientId::Zinc, &["oyster", "beef", "crab", "pumpkin seed"]),
    (
        NutrientId::VitaminA,
        &["carrot", "sweet potato", "liver", "kale", "butternut squash"],
    ),
    (NutrientId::VitaminE, &["almond", "sunflower seed", "hazelnut"]),
    (NutrientId::VitaminK, &["kale", "spinach", "broccoli", "cavolo nero"]),
    (NutrientId::Selenium, &["brazil nut", "tuna"]),
    (NutrientId::Iodine, &["seaweed", "nori", "cod", "haddock", "milk"]),
];

/// Primary-source keyword list for one nutrient, when curated
#[must_use]
pub fn primary_sources_for(nutrient: NutrientId) -> Option<&'static [&'static str]> {
    PRIMARY_SOURCES
        .iter()
        .find(|(n, _)| *n == nutrient)
        .map(|(_, sources)| *sources)
}
