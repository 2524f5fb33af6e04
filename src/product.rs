//! Product context: what is being marketed, and the rules that come with it.
//!
//! Two strategies coexist:
//!
//! * **Fixed catalog**: the product is one of a small closed set of
//!   [`ProductCategory`] values. Each carries a hand-authored
//!   [`CatalogEntry`] (grammatical gender, allowed and forbidden topics,
//!   hashtags) looked up by tag.
//! * **Dynamic**: a detection call produces an open-ended
//!   [`ProductDescriptor`] that is interpolated into a persona template.
//!
//! The resolved [`ProductContext`] travels with every generated result so that
//! regeneration reuses exactly the same persona.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the product context is chosen for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptStrategy {
    /// Product rules come from the hand-authored catalog. (default)
    #[default]
    FixedCatalog,
    /// Product is detected first; the persona is synthesised from the descriptor.
    Dynamic,
}

/// Closed set of products known to the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Smart treadmill line (Creator series).
    Treadmill,
    /// 3D body scanner / composition analyser.
    BodyScanner,
}

impl ProductCategory {
    /// Every catalog category, in catalog order.
    pub const ALL: [ProductCategory; 2] = [ProductCategory::Treadmill, ProductCategory::BodyScanner];

    /// The catalog entry for this category.
    pub fn entry(self) -> &'static CatalogEntry {
        match self {
            ProductCategory::Treadmill => &TREADMILL,
            ProductCategory::BodyScanner => &BODY_SCANNER,
        }
    }

    /// Stable tag used on the command line and in serialised results.
    pub fn tag(self) -> &'static str {
        match self {
            ProductCategory::Treadmill => "treadmill",
            ProductCategory::BodyScanner => "body-scanner",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Manual product selection supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductMode {
    /// Let the pipeline work out the product. (default)
    #[default]
    Auto,
    /// The caller pinned the product to a catalog entry.
    Fixed(ProductCategory),
}

impl FromStr for ProductMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ProductMode::Auto),
            "treadmill" | "esteira" => Ok(ProductMode::Fixed(ProductCategory::Treadmill)),
            "body-scanner" | "body_scanner" | "scanner" => {
                Ok(ProductMode::Fixed(ProductCategory::BodyScanner))
            }
            other => Err(format!(
                "unknown product mode '{other}' (expected auto, treadmill or body-scanner)"
            )),
        }
    }
}

/// Grammatical gender the copy must use when referring to the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammaticalGender {
    Feminine,
    Masculine,
}

impl GrammaticalGender {
    pub fn label(self) -> &'static str {
        match self {
            GrammaticalGender::Feminine => "FEMININO",
            GrammaticalGender::Masculine => "MASCULINO",
        }
    }
}

/// Hand-authored rule bundle for one catalog product.
#[derive(Debug)]
pub struct CatalogEntry {
    pub category: ProductCategory,
    /// How the persona names the product family.
    pub display_name: &'static str,
    /// Terms that identify the product in source material.
    pub aliases: &'static [&'static str],
    pub gender: GrammaticalGender,
    /// Example phrases showing the required article/agreement.
    pub gender_examples: &'static [&'static str],
    pub allowed_topics: &'static [&'static str],
    pub forbidden_topics: &'static [&'static str],
    pub brand_hashtag: &'static str,
    pub product_hashtag: &'static str,
}

static TREADMILL: CatalogEntry = CatalogEntry {
    category: ProductCategory::Treadmill,
    display_name: "ESTEIRA (Creator)",
    aliases: &["Treadmill", "Creator", "esteira inteligente"],
    gender: GrammaticalGender::Feminine,
    gender_examples: &["A Creator 600", "A esteira inteligente"],
    allowed_topics: &[
        "corrida e treino cardiovascular",
        "biomecânica da passada e amortecimento",
        "conectividade e treinos guiados",
        "durabilidade para uso comercial intenso",
        "experiência premium do aluno",
    ],
    forbidden_topics: &[
        "avaliação corporal 3D",
        "bioimpedância",
        "escaneamento ou medidas corporais",
    ],
    brand_hashtag: "#Visbody",
    product_hashtag: "#CreatorTreadmill",
};

static BODY_SCANNER: CatalogEntry = CatalogEntry {
    category: ProductCategory::BodyScanner,
    display_name: "SCANNER (Visbody R6/S30)",
    aliases: &["Body Scanner", "Visbody R6", "Visbody S30", "scanner 3D"],
    gender: GrammaticalGender::Masculine,
    gender_examples: &["O Visbody", "O scanner 3D"],
    allowed_topics: &[
        "avaliação física 3D",
        "bioimpedância e composição corporal",
        "precisão clínica",
        "retenção de alunos e aumento de ticket médio",
        "acompanhamento de evolução",
    ],
    forbidden_topics: &[
        "corrida, velocidade ou inclinação",
        "treino cardiovascular",
        "motor, lona ou amortecimento",
    ],
    brand_hashtag: "#Visbody",
    product_hashtag: "#Visbody3D",
};

/// Open-ended product descriptor produced by detection.
///
/// All four fields are always populated; detection fills gaps with
/// [`ProductDescriptor::fallback`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub differentiator: String,
}

impl ProductDescriptor {
    /// Generic placeholder used when detection fails.
    pub fn fallback() -> Self {
        Self {
            name: "Product".to_string(),
            brand: "Generic".to_string(),
            category: "Technology".to_string(),
            differentiator: "High Performance".to_string(),
        }
    }

    /// Hashtag built from the brand name, e.g. `#AcmeFitness`.
    ///
    /// A brand with no letters or digits yields the fallback brand's tag.
    pub fn brand_hashtag(&self) -> String {
        hashtag(&self.brand).unwrap_or_else(|| fallback_hashtag(|d| d.brand))
    }

    /// Hashtag built from the product name, e.g. `#RunnerX2`.
    pub fn product_hashtag(&self) -> String {
        hashtag(&self.name).unwrap_or_else(|| fallback_hashtag(|d| d.name))
    }
}

/// The product context a result was generated with.
///
/// Immutable once attached to a [`crate::output::GenerationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContext {
    pub mode: ProductMode,
    /// Present only when the dynamic strategy ran detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<ProductDescriptor>,
}

impl ProductContext {
    /// Context for the fixed catalog: no detection.
    pub fn catalog(mode: ProductMode) -> Self {
        Self {
            mode,
            detected: None,
        }
    }

    /// Context for the dynamic strategy after detection.
    pub fn detected(descriptor: ProductDescriptor) -> Self {
        Self {
            mode: ProductMode::Auto,
            detected: Some(descriptor),
        }
    }
}

/// Turn free text into a single CamelCase hashtag, if any word survives.
fn hashtag(text: &str) -> Option<String> {
    let body: String = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    (!body.is_empty()).then(|| format!("#{body}"))
}

fn fallback_hashtag(field: impl FnOnce(ProductDescriptor) -> String) -> String {
    format!("#{}", field(ProductDescriptor::fallback()))
}
