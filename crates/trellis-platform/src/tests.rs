#[cfg(test)]
mod tests {
    use crate::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use trellis_core::Size;
    use trellis_interop::{BridgeValue, LoadStatus, SubmitMode};
    use trellis_ui::Orientation;

    fn options(scripts: &[&str], styles: &[&str]) -> RuntimeOptions {
        RuntimeOptions {
            scripts: scripts.iter().map(|s| s.to_string()).collect(),
            styles: styles.iter().map(|s| s.to_string()).collect(),
            ..RuntimeOptions::default()
        }
    }

    /// Fires the first callback of the last recorded call whose source
    /// contains `needle`.
    fn fire(runtime: &Runtime<HeadlessBridge>, needle: &str, arg: &str) {
        let record = runtime
            .interop()
            .bridge()
            .records()
            .into_iter()
            .rev()
            .find(|r| r.source.contains(needle))
            .unwrap();
        runtime
            .interop()
            .bridge()
            .invoke(record.callbacks[0], vec![BridgeValue::String(arg.into())]);
    }

    #[test]
    fn test_options_from_json_fill_in_defaults() {
        let o = RuntimeOptions::from_json(r#"{"scripts": ["a.js"], "hostElementId": "app"}"#)
            .unwrap();
        assert_eq!(o.scripts, vec!["a.js"]);
        assert_eq!(o.host_element_id.as_deref(), Some("app"));
        assert_eq!(o.ledger_capacity, 8192);
        assert_eq!(o.batch_limit, 512);
        assert_eq!(o.log_level, "info");
    }

    #[test]
    fn test_options_reject_zero_limits() {
        let err = RuntimeOptions::from_json(r#"{"batchLimit": 0}"#).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"batchLimit must be at least 1");
        assert!(RuntimeOptions::from_json("not json").is_err());
    }

    #[test]
    fn test_boot_loads_scripts_then_styles() {
        let runtime = Runtime::new(HeadlessBridge::new(), options(&["a.js"], &["site.css"]));
        let ready = Rc::new(Cell::new(false));
        let r = ready.clone();
        runtime.boot(move || r.set(true));

        assert_eq!(runtime.state(), BootState::LoadingScripts);
        assert_eq!(runtime.loader().status("a.js"), LoadStatus::Pending(1));
        let sources = runtime.interop().bridge().sources();
        assert!(!sources.iter().any(|s| s.contains("stylesheet")));

        fire(&runtime, "'script'", "a.js");
        assert_eq!(runtime.state(), BootState::LoadingStyles);
        assert_eq!(runtime.loader().status("a.js"), LoadStatus::Loaded);
        assert!(!ready.get());

        fire(&runtime, "'stylesheet'", "site.css");
        assert_eq!(runtime.state(), BootState::Ready);
        assert!(ready.get());
    }

    #[test]
    fn test_failed_script_stops_the_boot() {
        let runtime = Runtime::new(HeadlessBridge::new(), options(&["a.js", "b.js"], &["x.css"]));
        runtime.boot(|| panic!("must not become ready"));

        let record = runtime.interop().bridge().records()[0].clone();
        runtime
            .interop()
            .bridge()
            .invoke(record.callbacks[1], vec![BridgeValue::String("a.js".into())]);

        assert_eq!(runtime.state(), BootState::Failed);
        assert_eq!(runtime.loader().status("b.js"), LoadStatus::NotStarted);
    }

    #[test]
    fn test_empty_boot_is_ready_at_once() {
        let runtime = launch_headless(RuntimeOptions::default()).unwrap();
        assert_eq!(runtime.state(), BootState::Ready);
    }

    #[test]
    fn test_launch_rejects_invalid_options() {
        let bad = RuntimeOptions {
            ledger_capacity: 0,
            ..RuntimeOptions::default()
        };
        assert!(launch_headless(bad).is_err());
    }

    #[test]
    fn test_mount_under_body_and_render() {
        let mut runtime = Runtime::new(HeadlessBridge::new(), RuntimeOptions::default());
        runtime
            .interop()
            .bridge()
            .respond(|src| (src == "document.body").then(|| Ok(BridgeValue::Object(900))));

        let tree = runtime.tree_mut();
        let root = tree.stack(Orientation::Horizontal);
        let child = tree.fixed(Size::new(40.0, 10.0));
        tree.append_child(root, child).unwrap();

        runtime.mount(root).unwrap();
        assert!(runtime.render(Size::new(200.0, 100.0)).unwrap());
        assert!(!runtime.render(Size::new(200.0, 100.0)).unwrap());
        assert_eq!(
            runtime.tree().rect(child).unwrap(),
            trellis_core::Rect::new(0.0, 0.0, 40.0, 100.0)
        );

        let records = runtime.interop().bridge().records();
        assert!(records.iter().any(|r| r.source == "document.body" && r.mode == SubmitMode::Sync));
        assert!(
            records
                .iter()
                .any(|r| r.mode == SubmitMode::Batched && r.source.contains(r#"["width"] = "200px""#))
        );
    }

    #[test]
    fn test_missing_host_element_is_an_error() {
        let mut runtime = Runtime::new(
            HeadlessBridge::new(),
            RuntimeOptions {
                host_element_id: Some("app".into()),
                ..RuntimeOptions::default()
            },
        );
        runtime
            .interop()
            .bridge()
            .respond(|src| src.contains("getElementById").then(|| Ok(BridgeValue::Null)));
        let err = runtime.host().unwrap_err();
        assert_eq!(err.to_string(), "host element #app not found");
    }

    #[test]
    fn test_render_without_root_does_nothing() {
        let mut runtime = Runtime::new(HeadlessBridge::new(), RuntimeOptions::default());
        assert!(!runtime.render(Size::new(10.0, 10.0)).unwrap());
    }

    #[test]
    fn test_reload_bootstraps_again_and_keeps_loads() {
        let mut runtime = Runtime::new(HeadlessBridge::new(), options(&["a.js"], &[]));
        runtime.boot(|| {});
        fire(&runtime, "'script'", "a.js");
        assert_eq!(runtime.state(), BootState::Ready);
        assert_eq!(runtime.interop().bridge().installs(), 1);

        runtime.reload();
        assert_eq!(runtime.state(), BootState::Idle);
        assert_eq!(runtime.loader().status("a.js"), LoadStatus::Loaded);

        // Nothing left to load, so the boot completes without a call.
        runtime.boot(|| {});
        assert_eq!(runtime.state(), BootState::Ready);
        runtime.interop().execute_void("noop()", &[]).unwrap();
        assert_eq!(runtime.interop().bridge().installs(), 2);
    }
}
