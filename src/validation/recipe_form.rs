//! Recipe create/edit form state.
//!
//! Holds the editable fields, runs every client-side check at once, and
//! merges server-side 422 errors under the same field keys so one lookup
//! ([`RecipeForm::field_error`]) answers for both.

use super::server::{ParsedFieldError, map_error_to_form_field};
use serde::{Deserialize, Serialize};

/// Valid values of [`RecipeFormData::status`].
pub const RECIPE_STATUSES: [i32; 4] = [1, 2, 3, 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    /// Unit id, see [`units`](crate::units).
    pub unit: u32,
}

impl Default for Ingredient {
    fn default() -> Self {
        Self {
            name: String::new(),
            amount: 0.0,
            unit: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeFormData {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub prep_time: u32,
    pub cook_time: u32,
    pub servings: i32,
    pub tags: Vec<String>,
    pub image: String,
    pub status: i32,
}

impl Default for RecipeFormData {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            prep_time: 0,
            cook_time: 0,
            servings: 1,
            tags: Vec::new(),
            image: String::new(),
            status: 1,
        }
    }
}

impl RecipeFormData {
    /// Zero servings or status mean "not set" and fall back to 1.
    fn with_fallbacks(mut self) -> Self {
        if self.servings == 0 {
            self.servings = 1;
        }
        if self.status == 0 {
            self.status = 1;
        }
        self
    }
}

/// Fields that differ from the recipe being edited. Unchanged fields are
/// `None` and left out of the serialised payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

impl RecipeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn changed<T: PartialEq + Clone>(current: &T, original: &T) -> Option<T> {
    (current != original).then(|| current.clone())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RecipeForm {
    pub form: RecipeFormData,
    /// Pending tag text for [`add_tag`](Self::add_tag) without an argument.
    pub new_tag: String,
    errors: Vec<ValidationError>,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RecipeForm {
    /// Start from existing data (editing) or blank. The ingredient list
    /// always starts with at least one row.
    pub fn new(initial: Option<RecipeFormData>) -> Self {
        let mut form = initial.unwrap_or_default().with_fallbacks();
        if form.ingredients.is_empty() {
            form.ingredients.push(Ingredient::default());
        }
        Self {
            form,
            new_tag: String::new(),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn total_time(&self) -> u32 {
        self.form.prep_time.saturating_add(self.form.cook_time)
    }

    fn push_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Run every check, replacing previous errors. Returns true when valid.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        let checks = [
            self.check_title(),
            self.check_description(),
            self.check_ingredients(),
            self.check_steps(),
            self.check_servings(),
            self.check_status(),
            self.check_image(),
        ];
        let mut valid = true;
        for (field, message) in checks.into_iter().flatten() {
            self.push_error(field, message);
            valid = false;
        }
        valid
    }

    fn check_title(&self) -> Option<(&'static str, &'static str)> {
        if self.form.title.trim().is_empty() {
            return Some(("title", "Recipe title is required"));
        }
        if self.form.title.chars().count() < 3 {
            return Some(("title", "Recipe title must be at least 3 characters"));
        }
        None
    }

    fn check_description(&self) -> Option<(&'static str, &'static str)> {
        if self.form.description.trim().is_empty() {
            return Some(("description", "Recipe description is required"));
        }
        if self.form.description.chars().count() < 10 {
            return Some(("description", "Description must be at least 10 characters"));
        }
        None
    }

    fn check_ingredients(&self) -> Option<(&'static str, &'static str)> {
        if self.form.ingredients.is_empty() {
            return Some(("ingredients", "At least one ingredient is required"));
        }
        if !self.form.ingredients.iter().any(|i| !i.name.trim().is_empty()) {
            return Some(("ingredients", "At least one non-empty ingredient is required"));
        }
        None
    }

    fn check_steps(&self) -> Option<(&'static str, &'static str)> {
        if self.form.steps.is_empty() {
            return Some(("steps", "At least one instruction step is required"));
        }
        if !self.form.steps.iter().any(|s| !s.trim().is_empty()) {
            return Some(("steps", "At least one non-empty instruction step is required"));
        }
        None
    }

    fn check_servings(&self) -> Option<(&'static str, &'static str)> {
        (self.form.servings < 1).then_some(("servings", "Servings must be at least 1"))
    }

    fn check_status(&self) -> Option<(&'static str, &'static str)> {
        (!RECIPE_STATUSES.contains(&self.form.status)).then_some(("status", "Invalid status value"))
    }

    fn check_image(&self) -> Option<(&'static str, &'static str)> {
        let image = self.form.image.trim();
        if image.is_empty() || url::Url::parse(&self.form.image).is_ok() {
            return None;
        }
        Some(("image", "Image must be a valid URL"))
    }

    /// First message recorded for `field`, client or server.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Record server-side errors under their form field keys.
    pub fn apply_server_errors(&mut self, errors: &[ParsedFieldError]) {
        for error in errors {
            let field = map_error_to_form_field(&error.path);
            self.push_error(&field, &error.message);
        }
    }

    pub fn add_ingredient(&mut self) {
        self.form.ingredients.push(Ingredient::default());
    }

    /// The last remaining row cannot be removed.
    pub fn remove_ingredient(&mut self, index: usize) {
        if self.form.ingredients.len() > 1 && index < self.form.ingredients.len() {
            self.form.ingredients.remove(index);
        }
    }

    pub fn add_step(&mut self) {
        self.form.steps.push(String::new());
    }

    /// The last remaining step cannot be removed.
    pub fn remove_step(&mut self, index: usize) {
        if self.form.steps.len() > 1 && index < self.form.steps.len() {
            self.form.steps.remove(index);
        }
    }

    /// Add `tag`, or the pending [`new_tag`](Self::new_tag) text when
    /// `None`. Empty and duplicate tags are ignored; the pending text is
    /// cleared only when it was used.
    pub fn add_tag(&mut self, tag: Option<&str>) {
        let candidate = match tag {
            Some(tag) => tag.to_string(),
            None => self.new_tag.trim().to_string(),
        };
        if candidate.is_empty() || self.form.tags.contains(&candidate) {
            return;
        }
        self.form.tags.push(candidate);
        if tag.is_none() {
            self.new_tag.clear();
        }
    }

    pub fn remove_tag(&mut self, index: usize) {
        if index < self.form.tags.len() {
            self.form.tags.remove(index);
        }
    }

    /// Replace all fields and clear errors and pending tag text.
    ///
    /// Unlike [`new`](Self::new), no blank ingredient row is added.
    pub fn reset(&mut self, data: Option<RecipeFormData>) {
        self.form = data.unwrap_or_default().with_fallbacks();
        self.errors.clear();
        self.new_tag.clear();
    }

    /// Submission payload: title and description trimmed, blank ingredient
    /// rows and steps dropped.
    pub fn form_data(&self) -> RecipeFormData {
        RecipeFormData {
            title: self.form.title.trim().to_string(),
            description: self.form.description.trim().to_string(),
            ingredients: self
                .form
                .ingredients
                .iter()
                .filter(|i| !i.name.trim().is_empty())
                .cloned()
                .collect(),
            steps: self
                .form
                .steps
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect(),
            ..self.form.clone()
        }
    }

    /// Fields of [`form_data`](Self::form_data) that differ from `original`.
    /// With no original every field is included.
    pub fn updated_data(&self, original: Option<&RecipeFormData>) -> RecipeUpdate {
        let current = self.form_data();
        let Some(original) = original else {
            return RecipeUpdate {
                title: Some(current.title),
                description: Some(current.description),
                ingredients: Some(current.ingredients),
                steps: Some(current.steps),
                prep_time: Some(current.prep_time),
                cook_time: Some(current.cook_time),
                servings: Some(current.servings),
                tags: Some(current.tags),
                image: Some(current.image),
                status: Some(current.status),
            };
        };
        RecipeUpdate {
            title: changed(&current.title, &original.title),
            description: changed(&current.description, &original.description),
            ingredients: changed(&current.ingredients, &original.ingredients),
            steps: changed(&current.steps, &original.steps),
            prep_time: changed(&current.prep_time, &original.prep_time),
            cook_time: changed(&current.cook_time, &original.cook_time),
            servings: changed(&current.servings, &original.servings),
            tags: changed(&current.tags, &original.tags),
            image: changed(&current.image, &original.image),
            status: changed(&current.status, &original.status),
        }
    }
}
