//! Form validation, client-side and server-side.
//!
//! - **Server**: decoding 422 `detail` arrays into readable field paths and messages
//! - **Profile**: email, password, username, display name and bio rules
//! - **Recipe form**: recipe editor state, checks and submission payloads

mod profile;
mod recipe_form;
mod server;

pub use profile::{
    FieldError, validate_bio, validate_display_name, validate_email, validate_password,
    validate_username,
};
pub use recipe_form::{
    Ingredient, RECIPE_STATUSES, RecipeForm, RecipeFormData, RecipeUpdate, ValidationError,
};
pub use server::{
    LocSegment, ParsedFieldError, ValidationErrorDetail, extract_validation_errors,
    format_field_path, group_errors_by_field, map_error_to_form_field, parse_validation_errors,
};
