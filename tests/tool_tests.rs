//! Tests for the tool system.

use parlor::agent::{build_agent, AgentCache, AgentSettings};
use parlor::error::ChatError;
use parlor::tools::builtin::{current_time_tool, CURRENT_TIME_TOOL};
use parlor::tools::{Tool, ToolArguments, ToolExecutionContext, ToolRegistry};
use regex::Regex;

#[tokio::test]
async fn current_time_is_iso8601_utc_seconds() {
    let tool = current_time_tool();
    let result = tool
        .execute(&ToolArguments::new(serde_json::json!({})), &ToolExecutionContext::default())
        .await
        .unwrap();

    let text = result.as_str().unwrap();
    let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap();
    assert!(pattern.is_match(text), "unexpected timestamp: {text}");

    let parsed = chrono::DateTime::parse_from_rfc3339(text).unwrap();
    let drift = chrono::Utc::now().signed_duration_since(parsed);
    assert!(drift.num_seconds().abs() < 5);
}

#[tokio::test]
async fn current_time_ignores_arguments() {
    let tool = current_time_tool();
    let result = tool
        .execute(
            &ToolArguments::new(serde_json::json!({"timezone": "Europe/Paris"})),
            &ToolExecutionContext::default(),
        )
        .await
        .unwrap();
    assert!(result.as_str().unwrap().ends_with('Z'));
}

#[test]
fn tool_schema_takes_no_parameters() {
    let tool = current_time_tool();
    let schema = &tool.parameters().schema;
    assert_eq!(schema["type"], "object");
    assert!(schema["properties"].as_object().map_or(true, |p| p.is_empty()));
}

#[test]
fn registry_rejects_unknown_tool_names() {
    let registry = ToolRegistry::builtin();
    assert_eq!(registry.names(), vec![CURRENT_TIME_TOOL]);
    let err = registry.resolve(["web_search"]).unwrap_err();
    assert!(matches!(err, ChatError::InvalidArgument(_)));
}

#[test]
fn build_agent_is_idempotent_through_the_cache() {
    let cache = AgentCache::new();
    let registry = ToolRegistry::builtin();
    let settings = AgentSettings::new("Assistant", "", "gpt-5-nano").with_tool(CURRENT_TIME_TOOL);

    let first = cache.get_or_build(&settings, &registry).unwrap();
    let second = cache.get_or_build(&settings.clone(), &registry).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let direct = build_agent("Assistant", "", "gpt-5-nano", vec![current_time_tool()]).unwrap();
    assert_eq!(direct.tool_names(), first.tool_names());
    assert_eq!(direct.instructions(), "");
}
