//! Property tests for command rendering
//!
//! Rendering must be a pure function of its inputs and always emit its parts
//! in a fixed order.

use camino::Utf8PathBuf;
use codechecker_resolver::AnalyzerHandle;
use codechecker_resolver::services::{CommandRenderer, RenderInput, parse_thread_count};
use proptest::prelude::*;

fn handle() -> AnalyzerHandle {
    AnalyzerHandle::new(Utf8PathBuf::from("/opt/codechecker/bin/CodeChecker"), "6.19.1")
}

fn render_input_strategy() -> impl Strategy<Value = RenderInput> {
    (
        prop_oneof![
            (0u32..256).prop_map(|n| n.to_string()),
            "[a-z]{0,4}",
            Just(String::new()),
        ],
        prop::collection::vec("[a-z][a-z+]{0,7}", 0..4),
        "[ a-z-]{0,20}",
        prop::option::of("/[a-z]{1,8}/[a-z_]{1,12}\\.json"),
    )
        .prop_map(|(threads, compilers, extra_options, log_file)| RenderInput {
            threads,
            compilers,
            extra_options,
            log_file: log_file.map(Utf8PathBuf::from),
        })
}

proptest! {
    #[test]
    fn prop_render_is_deterministic(input in render_input_strategy()) {
        let analyzer = handle();
        let first = CommandRenderer::render(Some(&analyzer), &input);
        let second = CommandRenderer::render(Some(&analyzer), &input.clone());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_render_without_analyzer_is_empty(input in render_input_strategy()) {
        prop_assert_eq!(CommandRenderer::render(None, &input), "");
    }

    #[test]
    fn prop_render_parts_in_order(input in render_input_strategy()) {
        let command = CommandRenderer::render(Some(&handle()), &input);

        let prefix = "\"/opt/codechecker/bin/CodeChecker\" analyze";
        prop_assert!(command.starts_with(prefix));
        let mut cursor = prefix.len();

        if let Some(log_file) = &input.log_file {
            let part = format!(" \"{}\"", log_file);
            prop_assert!(command[cursor..].starts_with(&part));
            cursor += part.len();
        }

        if let Some(threads) = parse_thread_count(&input.threads) {
            let part = format!(" -j {}", threads);
            prop_assert!(command[cursor..].starts_with(&part));
            cursor += part.len();
        }

        if !input.compilers.is_empty() {
            let part = format!(" --compilers {}", input.compilers.join(":"));
            prop_assert!(command[cursor..].starts_with(&part));
            cursor += part.len();
        }

        let extra = input.extra_options.trim();
        if extra.is_empty() {
            prop_assert_eq!(cursor, command.len());
        } else {
            prop_assert_eq!(&command[cursor..], format!(" {}", extra));
        }
    }
}
