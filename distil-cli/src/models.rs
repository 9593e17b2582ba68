//! Typed extraction targets.
//!
//! These derive both `Deserialize` and `JsonSchema`, so the same type
//! drives the schema sent to the model and the parsing of its reply.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A tourist attraction extracted from a page or text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Attraction {
    /// Name of the attraction.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// City the attraction is in.
    #[serde(default)]
    pub city: Option<String>,
}

impl Attraction {
    /// One-line rendering used when indexing or prompting.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = self.name.clone();
        if let Some(city) = &self.city {
            line.push_str(&format!(" ({city})"));
        }
        if let Some(description) = &self.description {
            line.push_str(": ");
            line.push_str(description);
        }
        line
    }
}

/// A list of attractions, as the model returns them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttractionList {
    /// The extracted attractions.
    pub attractions: Vec<Attraction>,
}

/// One activity within a day.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryItem {
    /// Time of day, e.g. "09:00" or "afternoon".
    pub time: String,
    /// What to do.
    pub activity: String,
}

/// One day of a trip plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryDay {
    /// Day number, starting at 1.
    pub day: u32,
    /// Activities for the day, in order.
    pub items: Vec<ItineraryItem>,
}

/// A complete trip plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Itinerary {
    /// Destination city or region.
    pub destination: String,
    /// Planned days, in order.
    pub days: Vec<ItineraryDay>,
}
