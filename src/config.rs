use std::error::Error;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Process-wide analyzer settings. Loaded once (either from a YAML file via
/// [`parse_settings`] or installed programmatically); falls back to defaults
/// when nothing was installed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub language: LanguageSettings,
    #[serde(default)]
    pub test: TestSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LanguageSettings {
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    /// Read by downstream sort/comparison components, never by the analyzer
    /// core itself.
    #[serde(default = "default_true")]
    pub nulls_larger: bool,
    #[serde(default = "default_anonymous_column_name")]
    pub anonymous_column_name: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        LanguageSettings {
            case_sensitive: true,
            nulls_larger: true,
            anonymous_column_name: default_anonymous_column_name(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestSettings {
    #[serde(default)]
    pub types: TypeGenSettings,
    #[serde(default)]
    pub expressions: ExpressionGenSettings,
    #[serde(default)]
    pub plans: PlanGenSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeGenSettings {
    #[serde(default)]
    pub allow_null_type: bool,
    #[serde(default)]
    pub allow_empty_struct_type: bool,
    #[serde(default = "default_true")]
    pub allow_nullable_complex_type: bool,
    #[serde(default = "default_true")]
    pub allow_nullable_array_type: bool,
    #[serde(default = "default_true")]
    pub allow_nullable_map_type: bool,
    #[serde(default = "default_true")]
    pub allow_nullable_struct_field: bool,
    #[serde(default = "default_true")]
    pub allow_nested_struct_type: bool,
    #[serde(default = "default_max_struct_type_width")]
    pub max_struct_type_width: usize,
}

impl Default for TypeGenSettings {
    fn default() -> Self {
        TypeGenSettings {
            allow_null_type: false,
            allow_empty_struct_type: false,
            allow_nullable_complex_type: true,
            allow_nullable_array_type: true,
            allow_nullable_map_type: true,
            allow_nullable_struct_field: true,
            allow_nested_struct_type: true,
            max_struct_type_width: default_max_struct_type_width(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpressionGenSettings {
    #[serde(default = "default_max_repetition")]
    pub max_repetition: usize,
    #[serde(default = "default_true")]
    pub only_logical_operators_in_predicate: bool,
    #[serde(default)]
    pub chances: ExpressionChances,
}

impl Default for ExpressionGenSettings {
    fn default() -> Self {
        ExpressionGenSettings {
            max_repetition: default_max_repetition(),
            only_logical_operators_in_predicate: true,
            chances: ExpressionChances::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpressionChances {
    #[serde(default = "default_null_chance")]
    pub null: f64,
}

impl Default for ExpressionChances {
    fn default() -> Self {
        ExpressionChances { null: default_null_chance() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanGenSettings {
    #[serde(default = "default_max_join_num")]
    pub max_join_num: usize,
    #[serde(default = "default_max_project_width")]
    pub max_project_width: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_max_expression_size")]
    pub max_expression_size: usize,
    #[serde(default = "default_max_expression_size")]
    pub max_where_predicate_size: usize,
    #[serde(default = "default_max_expression_size")]
    pub max_select_expression_size: usize,
    #[serde(default)]
    pub chances: PlanChances,
}

impl Default for PlanGenSettings {
    fn default() -> Self {
        PlanGenSettings {
            max_join_num: default_max_join_num(),
            max_project_width: default_max_project_width(),
            max_limit: default_max_limit(),
            max_expression_size: default_max_expression_size(),
            max_where_predicate_size: default_max_expression_size(),
            max_select_expression_size: default_max_expression_size(),
            chances: PlanChances::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanChances {
    #[serde(default = "default_clause_chance")]
    pub select_clause: f64,
    #[serde(default = "default_clause_chance")]
    pub from_clause: f64,
    #[serde(default = "default_half_chance")]
    pub where_clause: f64,
    #[serde(default = "default_half_chance")]
    pub limit_clause: f64,
    #[serde(default = "default_subquery_chance")]
    pub subquery: f64,
}

impl Default for PlanChances {
    fn default() -> Self {
        PlanChances {
            select_clause: default_clause_chance(),
            from_clause: default_clause_chance(),
            where_clause: default_half_chance(),
            limit_clause: default_half_chance(),
            subquery: default_subquery_chance(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_anonymous_column_name() -> String {
    "col".to_string()
}

fn default_max_struct_type_width() -> usize {
    4
}

fn default_max_repetition() -> usize {
    100
}

fn default_null_chance() -> f64 {
    0.1
}

fn default_max_join_num() -> usize {
    2
}

fn default_max_project_width() -> usize {
    6
}

fn default_max_limit() -> usize {
    100
}

fn default_max_expression_size() -> usize {
    8
}

fn default_clause_chance() -> f64 {
    0.9
}

fn default_half_chance() -> f64 {
    0.5
}

fn default_subquery_chance() -> f64 {
    0.2
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn parse_settings(config_path: &str) -> Result<Settings, Box<dyn Error>> {
    let settings = config::Config::builder()
        .add_source(config::File::from(std::path::Path::new(config_path)))
        .build()?
        .try_deserialize()?;
    Ok(settings)
}

/// Installs `settings` as the process-wide configuration. Returns false when
/// some earlier caller (or a settings read) already pinned them.
pub fn install_settings(settings: Settings) -> bool {
    SETTINGS.set(settings).is_ok()
}

pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::default)
}

pub fn case_sensitive() -> bool {
    settings().language.case_sensitive
}

pub fn anonymous_column_name() -> &'static str {
    &settings().language.anonymous_column_name
}

/// Name equality under the configured case policy.
pub fn name_eq(a: &str, b: &str) -> bool {
    if case_sensitive() {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

/// Folds a name into its lookup key under the configured case policy.
pub fn fold_name(name: &str) -> String {
    if case_sensitive() {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.language.case_sensitive);
        assert!(settings.language.nulls_larger);
        assert_eq!(settings.language.anonymous_column_name, "col");
        assert_eq!(settings.test.plans.max_join_num, 2);
        assert!(!settings.test.types.allow_null_type);
    }

    #[test]
    fn test_name_eq_case_sensitive_default() {
        assert!(name_eq("a", "a"));
        assert!(!name_eq("a", "A"));
    }
}
