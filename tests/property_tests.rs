//! Property-based tests for pipeline_logger using proptest

use pipeline_logger::prelude::*;
use pipeline_logger::{FormatToken, Renderer};
use proptest::prelude::*;

fn emittable_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Unknown),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warning),
        Just(LogLevel::Error),
    ]
}

fn gate_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Unknown),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warning),
        Just(LogLevel::Error),
        Just(LogLevel::None),
    ]
}

/// Template fragments: known fields, unknown fields, stray markers and text
fn template_chunk() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("%{DATETIME}".to_string()),
        Just("%{FILENAME}".to_string()),
        Just("%{LINE}".to_string()),
        Just("%{THREAD}".to_string()),
        Just("%{CONTEXT}".to_string()),
        Just("%{ERROR_CLASS}".to_string()),
        Just("%{MESSAGE}".to_string()),
        Just("%{UNKNOWN}".to_string()),
        Just("%{".to_string()),
        Just("}".to_string()),
        Just("%".to_string()),
        "[a-z :\\[\\]é-]{0,8}",
    ]
}

fn template() -> impl Strategy<Value = String> {
    prop::collection::vec(template_chunk(), 0..12).prop_map(|chunks| chunks.concat())
}

// ============================================================================
// FormatCache Tests
// ============================================================================

proptest! {
    /// Tokens concatenate back to the exact template, unknown spans included
    #[test]
    fn test_format_roundtrip(template in template()) {
        let cache = FormatCache::compile(template.clone());
        prop_assert_eq!(cache.reconstruct(), template.clone());
        prop_assert_eq!(cache.template(), template.as_str());
    }

    /// Literal runs are merged: two literals never sit next to each other
    #[test]
    fn test_no_adjacent_literals(template in template()) {
        let cache = FormatCache::compile(template);
        for pair in cache.tokens().windows(2) {
            prop_assert!(!(pair[0].is_literal() && pair[1].is_literal()));
        }
        for token in cache.tokens() {
            if let FormatToken::Literal(text) = token {
                prop_assert!(!text.is_empty());
            }
        }
    }

    /// Any text survives rendering through `%{MESSAGE}` untouched
    #[test]
    fn test_message_rendered_verbatim(text in ".*", level in emittable_level()) {
        let format = FormatCache::compile("%{MESSAGE}");
        let message = Message::new(level, text.clone(), &CallSite::new("p.rs", 1, "", "f"), false);
        let (line, diagnostic) = Renderer::render_to_string(&format, &message);
        prop_assert_eq!(line, text);
        prop_assert!(diagnostic.is_none());
    }
}

// ============================================================================
// LogLevel and LevelGate Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in gate_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    /// Test that LogLevel ordering follows the numeric representation
    #[test]
    fn test_log_level_ordering(a in gate_level(), b in gate_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
    }

    /// A sink receives a message iff its gate is at or below the message level
    #[test]
    fn test_gate_delivery(
        level in emittable_level(),
        terminal in gate_level(),
        file in gate_level(),
    ) {
        let gate = LevelGate::new(terminal, file);
        prop_assert_eq!(gate.should_deliver_to_terminal(level), level >= terminal && terminal != LogLevel::None);
        prop_assert_eq!(gate.should_deliver_to_file(level), level >= file && file != LogLevel::None);
        prop_assert_eq!(
            gate.accepts(level),
            gate.should_deliver_to_terminal(level) || gate.should_deliver_to_file(level)
        );
    }

    /// `None` never passes any gate
    #[test]
    fn test_none_message_never_delivered(terminal in gate_level(), file in gate_level()) {
        let gate = LevelGate::new(terminal, file);
        prop_assert!(!gate.should_deliver_to_terminal(LogLevel::None));
        prop_assert!(!gate.should_deliver_to_file(LogLevel::None));
    }

    /// Severe levels go to stderr, the rest to stdout
    #[test]
    fn test_severity_split(level in emittable_level()) {
        prop_assert_eq!(level.is_severe(), level > LogLevel::Info);
    }

    /// Test that parsing accepts case-insensitive input
    #[test]
    fn test_log_level_case_insensitive(use_lower in any::<bool>()) {
        for name in ["UNKNOWN", "DEBUG", "INFO", "WARNING", "ERROR", "NONE"] {
            let input = if use_lower { name.to_lowercase() } else { name.to_string() };
            prop_assert!(input.parse::<LogLevel>().is_ok(), "Failed to parse: {}", input);
        }
    }
}

// ============================================================================
// Message Tests
// ============================================================================

proptest! {
    /// Context is `class::function`, or `function` alone without a class
    #[test]
    fn test_context_join(class in "[A-Za-z]{0,6}", function in "[a-z_]{1,8}") {
        let site = CallSite::new("m.rs", 1, &class, &function);
        let message = Message::new(LogLevel::Info, String::new(), &site, false);
        if class.is_empty() {
            prop_assert_eq!(message.context, function);
        } else {
            prop_assert_eq!(message.context, format!("{}::{}", class, function));
        }
    }

    /// Truncation keeps only the last path component
    #[test]
    fn test_filename_truncation(dirs in prop::collection::vec("[a-z]{1,5}", 0..4), name in "[a-z]{1,8}\\.rs") {
        let mut path = dirs.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&name);

        let site = CallSite::new(&path, 1, "", "f");
        prop_assert_eq!(Message::new(LogLevel::Info, String::new(), &site, true).file, name);
        prop_assert_eq!(Message::new(LogLevel::Info, String::new(), &site, false).file, path.clone());
    }
}
