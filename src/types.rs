use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Title of the placeholder record used when a search yields nothing.
pub const NO_PRODUCTS_TITLE: &str = "No products found";

/// Text stored when the recommendation stage gets an empty reply.
pub const NO_RECOMMENDATION: &str = "No recommendation available.";

/// Product category offered by the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Category {
    Computers,
    Smartphones,
    Tablets,
    #[value(name = "tvs")]
    Tvs,
    Cameras,
    AudioEquipment,
    HomeAppliances,
    Books,
    Clothing,
    SportsEquipment,
    ToysAndGames,
    HealthAndBeauty,
    Automotive,
    GardenAndOutdoor,
    OfficeSupplies,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 15] = [
        Category::Computers,
        Category::Smartphones,
        Category::Tablets,
        Category::Tvs,
        Category::Cameras,
        Category::AudioEquipment,
        Category::HomeAppliances,
        Category::Books,
        Category::Clothing,
        Category::SportsEquipment,
        Category::ToysAndGames,
        Category::HealthAndBeauty,
        Category::Automotive,
        Category::GardenAndOutdoor,
        Category::OfficeSupplies,
    ];

    /// Human-readable label, as substituted into the search prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Computers => "Computers",
            Category::Smartphones => "Smartphones",
            Category::Tablets => "Tablets",
            Category::Tvs => "TVs",
            Category::Cameras => "Cameras",
            Category::AudioEquipment => "Audio Equipment",
            Category::HomeAppliances => "Home Appliances",
            Category::Books => "Books",
            Category::Clothing => "Clothing",
            Category::SportsEquipment => "Sports Equipment",
            Category::ToysAndGames => "Toys & Games",
            Category::HealthAndBeauty => "Health & Beauty",
            Category::Automotive => "Automotive",
            Category::GardenAndOutdoor => "Garden & Outdoor",
            Category::OfficeSupplies => "Office Supplies",
        }
    }

    /// All categories sorted by label, the order the selector presents them in.
    pub fn sorted() -> Vec<Category> {
        let mut all = Self::ALL.to_vec();
        all.sort_by_key(|c| c.label());
        all
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parse a category from its label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown product category: '{}'", wanted))
    }
}

/// Input to a pipeline run: what the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text product name.
    pub product: String,

    /// Selected product category.
    pub category: Category,
}

impl SearchQuery {
    pub fn new(product: impl Into<String>, category: Category) -> Self {
        Self {
            product: product.into(),
            category,
        }
    }
}

/// One product parsed from the search reply.
///
/// Fields are filled in as their marker lines are seen; absent fields
/// are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProductRecord {
    /// Start a record with only its title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// The placeholder record substituted for an empty result list.
    pub fn sentinel() -> Self {
        Self::titled(NO_PRODUCTS_TITLE)
    }
}

/// Ordered, never-empty list of parsed products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults(Vec<ProductRecord>);

impl SearchResults {
    /// Wrap parsed records, substituting the sentinel when there are none.
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        if records.is_empty() {
            Self(vec![ProductRecord::sentinel()])
        } else {
            Self(records)
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for results built by [`from_records`](Self::from_records).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is the single "No products found" placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.0.len() == 1 && self.0[0] == ProductRecord::sentinel()
    }

    /// Serialize the records to the text embedded in the recommendation prompt.
    pub fn to_prompt_text(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl IntoIterator for SearchResults {
    type Item = ProductRecord;
    type IntoIter = std::vec::IntoIter<ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The recommendation text, shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation(String);

impl Recommendation {
    /// Wrap a raw reply, falling back to [`NO_RECOMMENDATION`] when it is empty.
    pub fn from_response(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self(NO_RECOMMENDATION.to_string())
        } else {
            Self(text)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_fallback(&self) -> bool {
        self.0 == NO_RECOMMENDATION
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub query: SearchQuery,
    pub search_results: SearchResults,
    pub recommendation: Recommendation,
}

/// Progress update emitted at the start of each stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Current stage index (0-based).
    pub stage_index: usize,

    /// Total number of stages in the pipeline.
    pub total_stages: usize,

    /// Name of the current stage.
    pub stage_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_categories() {
        let labels: Vec<&str> = Category::sorted().iter().map(|c| c.label()).collect();
        assert_eq!(labels.len(), 15);
        assert_eq!(labels[0], "Audio Equipment");
        assert_eq!(labels[1], "Automotive");
        assert_eq!(labels[14], "Toys & Games");
        let mut expected = labels.clone();
        expected.sort();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_category_from_label() {
        assert_eq!("Toys & Games".parse::<Category>(), Ok(Category::ToysAndGames));
        assert_eq!("tvs".parse::<Category>(), Ok(Category::Tvs));
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_empty_results_become_sentinel() {
        let results = SearchResults::from_records(Vec::new());
        assert_eq!(results.len(), 1);
        assert!(results.is_sentinel());
        assert_eq!(results.records()[0].title.as_deref(), Some(NO_PRODUCTS_TITLE));
        assert!(results.records()[0].price.is_none());
    }

    #[test]
    fn test_real_results_are_not_sentinel() {
        let results = SearchResults::from_records(vec![ProductRecord::titled("Logitech M185")]);
        assert!(!results.is_sentinel());
    }

    #[test]
    fn test_prompt_text_omits_absent_fields() {
        let results = SearchResults::from_records(Vec::new());
        assert_eq!(
            results.to_prompt_text().unwrap(),
            r#"[{"title":"No products found"}]"#
        );
    }

    #[test]
    fn test_recommendation_fallback() {
        assert_eq!(Recommendation::from_response("").as_str(), NO_RECOMMENDATION);
        let blank = Recommendation::from_response("  \n");
        assert_eq!(blank.as_str(), "  \n");
        assert!(!blank.is_fallback());
        let rec = Recommendation::from_response("Buy the M185.");
        assert_eq!(rec.as_str(), "Buy the M185.");
        assert!(!rec.is_fallback());
    }
}
