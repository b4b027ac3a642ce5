//! Core types for fitcoach — request payloads, the response envelope, and the
//! unified nutrition shape.
//!
//! Wire format is camelCase JSON throughout, matching what the surrounding
//! application layer (HTTP handlers, bot plumbing) serializes to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────
// Request categories
// ─────────────────────────────────────────────

/// Classification of an incoming AI request.
///
/// The category determines which provider chain handles the request and which
/// cache TTL applies to its results. The mapping is static configuration,
/// wired once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiCategory {
    FoodAnalysis,
    NutritionAdvice,
    ProgressAnalysis,
    WorkoutPlanning,
    ChatResponse,
    ComplexQuery,
}

impl AiCategory {
    /// Stable lowercase name, used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiCategory::FoodAnalysis => "food_analysis",
            AiCategory::NutritionAdvice => "nutrition_advice",
            AiCategory::ProgressAnalysis => "progress_analysis",
            AiCategory::WorkoutPlanning => "workout_planning",
            AiCategory::ChatResponse => "chat_response",
            AiCategory::ComplexQuery => "complex_query",
        }
    }

    /// All categories, for wiring routes and for exhaustiveness in tests.
    pub fn all() -> &'static [AiCategory] {
        &[
            AiCategory::FoodAnalysis,
            AiCategory::NutritionAdvice,
            AiCategory::ProgressAnalysis,
            AiCategory::WorkoutPlanning,
            AiCategory::ChatResponse,
            AiCategory::ComplexQuery,
        ]
    }
}

impl fmt::Display for AiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Request payloads
// ─────────────────────────────────────────────

/// Free-text payload for an AI request. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct AiPrompt {
    /// The user-facing content to analyze or respond to.
    pub content: String,
    /// Optional task framing prepended as a system hint (e.g. "Meal photo
    /// analysis").
    pub context: Option<String>,
}

impl AiPrompt {
    pub fn new(content: impl Into<String>) -> Self {
        AiPrompt {
            content: content.into(),
            context: None,
        }
    }

    pub fn with_context(content: impl Into<String>, context: impl Into<String>) -> Self {
        AiPrompt {
            content: content.into(),
            context: Some(context.into()),
        }
    }
}

/// A nutrition lookup: food name plus requested portion weight in grams.
#[derive(Clone, Debug, PartialEq)]
pub struct FoodQuery {
    pub name: String,
    pub weight_g: f64,
}

impl FoodQuery {
    pub fn new(name: impl Into<String>, weight_g: f64) -> Self {
        FoodQuery {
            name: name.into(),
            weight_g,
        }
    }
}

// ─────────────────────────────────────────────
// AI reply payload
// ─────────────────────────────────────────────

/// Text produced by an LLM provider. Flattens into the envelope as
/// `"content"` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiReply {
    pub content: String,
}

impl AiReply {
    pub fn new(content: impl Into<String>) -> Self {
        AiReply {
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Nutrition facts (unified across all backends)
// ─────────────────────────────────────────────

/// Nutrition data for one portion of one food, in a single shape regardless
/// of which backend produced it.
///
/// Macro fields are grams for the portion `weight` (itself in grams); sodium
/// and the vitamin/mineral fields are milligrams. Optional fields stay
/// `None` when a backend did not report them — absent is distinguishable
/// from reported-as-zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iron: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    /// Portion weight in grams that the numeric fields describe.
    pub weight: f64,
    /// Which backend reported this (e.g. "FatSecret", "USDA", "local").
    pub source: String,
}

impl NutritionFacts {
    /// Facts with only the required macro fields set.
    pub fn basic(
        name: impl Into<String>,
        calories: f64,
        protein: f64,
        carbohydrates: f64,
        fat: f64,
        weight: f64,
        source: impl Into<String>,
    ) -> Self {
        NutritionFacts {
            name: name.into(),
            calories,
            protein,
            carbohydrates,
            fat,
            fiber: None,
            sugar: None,
            sodium: None,
            vitamin_c: None,
            calcium: None,
            iron: None,
            potassium: None,
            weight,
            source: source.into(),
        }
    }

    /// Linearly rescale every numeric field to a new portion weight.
    ///
    /// Backends report values for a reference weight (typically 100 g); this
    /// converts them to the requested portion. Absent optional fields remain
    /// absent. A non-positive reference weight cannot be scaled and returns
    /// the facts unchanged.
    pub fn scale_to_weight(&self, target_weight: f64) -> Self {
        if self.weight <= 0.0 {
            return self.clone();
        }

        let factor = target_weight / self.weight;
        let scale_opt = |v: Option<f64>| v.map(|x| x * factor);

        NutritionFacts {
            name: self.name.clone(),
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbohydrates: self.carbohydrates * factor,
            fat: self.fat * factor,
            fiber: scale_opt(self.fiber),
            sugar: scale_opt(self.sugar),
            sodium: scale_opt(self.sodium),
            vitamin_c: scale_opt(self.vitamin_c),
            calcium: scale_opt(self.calcium),
            iron: scale_opt(self.iron),
            potassium: scale_opt(self.potassium),
            weight: target_weight,
            source: self.source.clone(),
        }
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{}: {:.1} kcal, {:.1}/{:.1}/{:.1} p/f/c ({:.1}g) [{}]",
            self.name,
            self.calories,
            self.protein,
            self.fat,
            self.carbohydrates,
            self.weight,
            self.source
        )
    }
}

/// Wrapper giving nutrition results their `"nutrition"` wire field when
/// flattened into the envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodNutrition {
    pub nutrition: NutritionFacts,
}

impl From<NutritionFacts> for FoodNutrition {
    fn from(nutrition: NutritionFacts) -> Self {
        FoodNutrition { nutrition }
    }
}

// ─────────────────────────────────────────────
// Response envelope
// ─────────────────────────────────────────────

/// Machine-readable failure class carried by failed envelopes.
///
/// Only `ChainExhausted` (the providers themselves failed) and `NotFound`
/// (providers answered but had no data) ever reach callers; everything else
/// is degraded or retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    ChainExhausted,
    NotFound,
    Internal,
}

/// The caller-visible result of one routed request.
///
/// Built by the router on every path; `processing_time_ms` is stamped
/// immediately before return, success or failure. Failure messages are
/// generic and never leak provider internals — those go to the logs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<V> {
    pub success: bool,
    /// Result payload, flattened into the envelope (`content` for AI
    /// replies, `nutrition` for food lookups). Absent on failure.
    #[serde(flatten)]
    pub payload: Option<V>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Whether the payload came from the cache rather than a provider call.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    pub created_at: DateTime<Utc>,
}

impl<V> Envelope<V> {
    /// Successful envelope carrying a provider result.
    pub fn success(payload: V, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Envelope {
            success: true,
            payload: Some(payload),
            provider: Some(provider.into()),
            model: Some(model.into()),
            tokens_used: None,
            cost_usd: None,
            processing_time_ms: 0,
            error_message: None,
            error_code: None,
            cached: false,
            created_at: Utc::now(),
        }
    }

    /// Failed envelope with a generic user-facing message.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            payload: None,
            provider: None,
            model: None,
            tokens_used: None,
            cost_usd: None,
            processing_time_ms: 0,
            error_message: Some(message.into()),
            error_code: Some(code),
            cached: false,
            created_at: Utc::now(),
        }
    }

    /// Attach token/cost usage reported by the provider.
    pub fn with_usage(mut self, tokens_used: Option<u32>, cost_usd: Option<f64>) -> Self {
        self.tokens_used = tokens_used;
        self.cost_usd = cost_usd;
        self
    }

    /// Stamp total processing time. Called on every return path.
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = ms;
        self
    }

    /// Mark the payload as served from cache.
    pub fn mark_cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
