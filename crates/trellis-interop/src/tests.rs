#[cfg(test)]
mod tests {
    use crate::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_core::{EasingDescriptor, Error, Size};

    fn headless() -> Interop<HeadlessBridge> {
        Interop::new(HeadlessBridge::new(), Rc::new(InteropContext::default()))
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let push = move |tag: &str| -> Box<dyn Fn()> {
            let s = s.clone();
            let tag = tag.to_string();
            Box::new(move || s.borrow_mut().push(tag.clone()))
        };
        (seen, push)
    }

    #[test]
    fn test_execute_substitutes_placeholders() {
        let interop = headless();
        interop
            .execute_void("foo($0,$1)", &["null-like".into(), 10.into()])
            .unwrap();
        assert_eq!(interop.bridge().sources(), vec![r#"foo("null-like",10)"#]);
    }

    #[test]
    fn test_substitute_high_index_first() {
        let args: Vec<String> = (0..11).map(|i| format!("a{i}")).collect();
        assert_eq!(substitute("$10-$1-$0", &args), "a10-a1-a0");
        assert_eq!(substitute("$1$0", &args), "a1a0");
        // Only two args: `$10` reads as `$1` followed by `0`.
        assert_eq!(substitute("$10", &args[..2]), "a10");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let args = vec!["\"$1\"".to_string(), "x".to_string()];
        assert_eq!(substitute("f($0, $1)", &args), "f(\"$1\", x)");
    }

    proptest! {
        #[test]
        fn low_placeholder_never_corrupts_high(
            order in prop::collection::vec(0usize..11, 1..24),
            values in prop::collection::vec("[a-z$0-9]{0,6}", 11),
        ) {
            let template = order.iter().map(|i| format!("${i}")).collect::<Vec<_>>().join(",");
            let expected = order.iter().map(|&i| values[i].clone()).collect::<Vec<_>>().join(",");
            prop_assert_eq!(substitute(&template, &values), expected);
        }
    }

    #[test]
    fn test_argument_encoding() {
        let interop = headless();
        interop
            .execute_async(
                "f($0, $1, $2, $3, $4, $5)",
                &[
                    Arg::Null,
                    true.into(),
                    1234567.25.into(),
                    "say \"hi\"\n".into(),
                    Arg::Array(vec![1.into(), Arg::raw("window")]),
                    Arg::Object(vec![("k".into(), 0.5.into())]),
                ],
            )
            .unwrap();
        interop.flush();
        let sources = interop.bridge().sources();
        insta::assert_snapshot!(
            &sources[0],
            @r#"f(null, true, 1234567.25, "say \"hi\"\n", [1, window], {"k": 0.5})"#
        );
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(encode_number(f64::NAN), "NaN");
        assert_eq!(encode_number(f64::INFINITY), "Infinity");
        assert_eq!(encode_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(encode_number(0.1), "0.1");
        assert_eq!(encode_number(-3.0), "-3");
    }

    #[test]
    fn test_async_and_no_impact_is_rejected_before_bridge() {
        let interop = headless();
        let err = interop
            .execute("f()", &[], CallFlags::ASYNC | CallFlags::NO_IMPACT)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCallMode(_)));
        assert!(interop.bridge().records().is_empty());
        assert_eq!(interop.bridge().installs(), 0);
        assert!(interop.context().ledger.is_empty());
    }

    #[test]
    fn test_sync_call_flushes_pending_batch_first() {
        let interop = headless();
        interop.execute_async("a()", &[]).unwrap();
        interop.execute_async("b()", &[]).unwrap();
        assert!(interop.bridge().records().is_empty());

        interop.execute_void("c()", &[]).unwrap();
        let modes: Vec<_> = interop.bridge().records().iter().map(|r| r.mode).collect();
        assert_eq!(
            modes,
            vec![SubmitMode::Batched, SubmitMode::Batched, SubmitMode::Sync]
        );
        assert_eq!(interop.bridge().sources(), vec!["a()", "b()", "c()"]);
    }

    #[test]
    fn test_no_impact_call_leaves_batch_alone() {
        let interop = headless();
        interop.execute_async("a()", &[]).unwrap();
        interop
            .execute("peek()", &[], CallFlags::NO_IMPACT)
            .unwrap();

        assert_eq!(interop.pending_batch(), 1);
        let records = interop.bridge().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode, SubmitMode::SyncNoImpact);

        interop.flush();
        assert_eq!(interop.bridge().sources(), vec!["peek()", "a()"]);
    }

    #[test]
    fn test_batch_limit_flushes() {
        let interop = Interop::with_batch_limit(
            HeadlessBridge::new(),
            Rc::new(InteropContext::default()),
            2,
        );
        interop.execute_async("a()", &[]).unwrap();
        assert_eq!(interop.pending_batch(), 1);
        interop.execute_async("b()", &[]).unwrap();
        assert_eq!(interop.pending_batch(), 0);
        assert_eq!(interop.bridge().records().len(), 2);
    }

    #[test]
    fn test_wrapped_call_carries_ledger_index() {
        let interop = headless();
        interop.execute_async("foo(\"a\")", &[]).unwrap();
        interop.flush();
        let records = interop.bridge().records();
        insta::assert_snapshot!(
            &records[0].wrapped,
            @r#"trellis.callSafe(null, "foo(\"a\")", 0)"#
        );
    }

    #[test]
    fn test_failed_sync_call_is_reported_and_yields_undefined() {
        let interop = headless();
        interop
            .bridge()
            .fail_when("boom", "ReferenceError: boom is not defined");

        let v = interop.execute("boom($0)", &[1.into()], CallFlags::SYNC).unwrap();
        assert_eq!(v, Value::Undefined);

        let index = interop.bridge().records()[0].index;
        assert_eq!(interop.context().ledger.source(index).as_deref(), Some("boom(1)"));
        assert_eq!(
            interop.report_error("ReferenceError: boom is not defined", index),
            "Error in the following javascript code:\n\nboom(1)\n\n----- Error: -----\n\nReferenceError: boom is not defined\n"
        );
    }

    #[test]
    fn test_successful_sync_call_clears_ledger_slot() {
        let interop = headless();
        interop.execute_void("ok()", &[]).unwrap();
        let index = interop.bridge().records()[0].index;
        assert_eq!(interop.context().ledger.source(index), None);
        assert_eq!(interop.context().ledger.len(), 1);
    }

    #[test]
    fn test_batched_faults_come_back_through_hooks() {
        let interop = headless();
        interop.bridge().fail_when("explode", "TypeError");
        interop.execute_async("fine()", &[]).unwrap();
        interop.execute_async("explode()", &[]).unwrap();
        interop.flush();

        assert_eq!(interop.bridge().deliver_faults(), 1);
        assert_eq!(interop.bridge().deliver_faults(), 0);
    }

    #[test]
    fn test_handle_results_become_references() {
        let interop = headless();
        let v = interop
            .execute("document.createElement($0)", &["div".into()], CallFlags::SYNC)
            .unwrap();
        let r = v.as_js_ref().expect("handle result");
        assert_eq!(interop.resolve(r), Some(1));

        let records = interop.bridge().records();
        let record = &records[0];
        assert!(
            record
                .wrapped
                .starts_with(&format!("trellis.callSafe({}, ", r.id()))
        );

        // The token is what later calls embed.
        interop.execute_async("$0.remove()", &[r.into()]).unwrap();
        interop.flush();
        assert_eq!(
            interop.bridge().sources()[1],
            format!("trellis.refs[{}].remove()", r.id())
        );
    }

    #[test]
    fn test_reference_ids_are_monotonic() {
        let table: ReferenceTable<&str> = ReferenceTable::new();
        let a = table.allocate("a");
        let b = table.allocate("b");
        assert!(b.id() > a.id());
        assert_eq!(table.resolve(a), Some("a"));
        assert!(table.bind(99, "late").is_err());
        let reserved = table.reserve();
        assert_eq!(table.bind(reserved, "c").unwrap().id(), reserved);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_reference_allocation_across_threads() {
        let table: ReferenceTable<u64> = ReferenceTable::new();
        let per_thread = 200;
        let refs: Vec<Vec<JsRef>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8u64)
                .map(|t| {
                    let table = &table;
                    scope.spawn(move || {
                        (0..per_thread)
                            .map(|i| table.allocate(t * 1000 + i))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        for seq in &refs {
            assert!(seq.windows(2).all(|w| w[0].id() < w[1].id()));
        }
        let mut all: Vec<RefId> = refs.iter().flatten().map(JsRef::id).collect();
        all.sort_unstable();
        let expected: Vec<RefId> = (1..=8 * per_thread).collect();
        assert_eq!(all, expected);
        for (t, seq) in refs.iter().enumerate() {
            for (i, r) in seq.iter().enumerate() {
                assert_eq!(table.resolve(*r), Some(t as u64 * 1000 + i as u64));
            }
        }
        assert_eq!(table.len(), 8 * per_thread as usize);
    }

    #[test]
    fn test_ledger_records_across_threads() {
        let ledger = CallLedger::default();
        let indices: Vec<(usize, CallIndex)> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|t| {
                    let ledger = &ledger;
                    scope.spawn(move || {
                        (0..100)
                            .map(|i| (t * 100 + i, ledger.record(format!("call {}", t * 100 + i))))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });

        assert_eq!(ledger.len(), 400);
        let mut seen: Vec<CallIndex> = indices.iter().map(|&(_, index)| index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..400).collect::<Vec<_>>());
        for (n, index) in indices {
            assert_eq!(ledger.source(index), Some(format!("call {n}")));
        }
    }

    #[test]
    fn test_callbacks_receive_decoded_arguments() {
        let interop = headless();
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = got.clone();
        interop
            .execute_async(
                "on($0)",
                &[Arg::callback(move |args: &[Value]| {
                    g.borrow_mut().extend_from_slice(args)
                })],
            )
            .unwrap();
        interop.flush();

        let id = interop.bridge().records()[0].callbacks[0];
        assert_eq!(interop.bridge().sources()[0], format!("on(trellis.callback({id}))"));

        interop.bridge().invoke(
            id,
            vec![BridgeValue::String("x".into()), BridgeValue::Object(7)],
        );
        let got = got.borrow();
        assert_eq!(got[0], Value::String("x".into()));
        let r = got[1].as_js_ref().unwrap();
        assert_eq!(interop.resolve(r), Some(7));
    }

    #[test]
    fn test_callback_argument_references_are_stored_on_the_surface() {
        let interop = headless();
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = got.clone();
        interop
            .execute_void(
                "on($0)",
                &[Arg::callback(move |args: &[Value]| {
                    g.borrow_mut().extend_from_slice(args)
                })],
            )
            .unwrap();
        let id = interop.bridge().records()[0].callbacks[0];
        // The sync call above reserved its own id and bound nothing new.
        assert!(interop.bridge().bound_handles().is_empty());

        interop.bridge().invoke(id, vec![BridgeValue::Object(7)]);
        let r = got.borrow()[0].as_js_ref().unwrap();
        assert_eq!(interop.bridge().bound_handles(), vec![(r.id(), 7)]);

        interop.execute_void("$0.focus()", &[r.into()]).unwrap();
        assert_eq!(
            interop.bridge().sources().last().unwrap(),
            &format!("trellis.refs[{}].focus()", r.id())
        );
    }

    #[test]
    fn test_function_results_are_kept_as_references() {
        assert!(BOOTSTRAP_JS.contains("kind === 'function'"));

        let interop = headless();
        interop
            .bridge()
            .respond(|src| src.contains("getHandler").then(|| Ok(BridgeValue::Object(42))));
        let r = interop
            .execute("el.getHandler()", &[], CallFlags::SYNC)
            .unwrap()
            .as_js_ref()
            .unwrap();
        assert_eq!(interop.resolve(r), Some(42));
        assert!(interop.bridge().bound_handles().is_empty());
    }

    #[test]
    fn test_released_callback_is_ignored() {
        let interop = headless();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = interop
            .context()
            .callbacks
            .register(Rc::new(move |_: &[Value]| *h.borrow_mut() += 1));
        interop.ensure_initialized();

        interop.bridge().invoke(id, vec![]);
        assert!(interop.release_callback(id));
        interop.bridge().invoke(id, vec![]);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_reload_reinstalls_but_keeps_tables() {
        let interop = headless();
        let r = interop
            .execute("document.createElement('p')", &[], CallFlags::SYNC)
            .unwrap()
            .as_js_ref()
            .unwrap();
        interop.execute_void("x()", &[]).unwrap();
        assert_eq!(interop.bridge().installs(), 1);

        interop.context().reload();
        assert!(!interop.context().is_initialized());
        interop.execute_void("y()", &[]).unwrap();
        assert_eq!(interop.bridge().installs(), 2);
        assert_eq!(interop.resolve(r), Some(1));
        assert_eq!(interop.context().ledger.len(), 3);
    }

    #[test]
    fn test_typed_readers() {
        let interop = headless();
        interop.bridge().respond(|src| match src {
            "n()" => Some(Ok(BridgeValue::Number(2.5))),
            "s()" => Some(Ok(BridgeValue::String("hi".into()))),
            "b()" => Some(Ok(BridgeValue::Bool(true))),
            _ => None,
        });
        assert_eq!(interop.execute_f64("n()", &[]).unwrap(), 2.5);
        assert_eq!(interop.execute_string("s()", &[]).unwrap(), "hi");
        assert!(interop.execute_bool("b()", &[]).unwrap());
        assert_eq!(interop.execute_string("nothing()", &[]).unwrap(), "");
        assert!(matches!(
            interop.execute_f64("nothing()", &[]),
            Err(Error::Bridge(_))
        ));
    }

    // Resource loading

    fn script_loads(interop: &Interop<HeadlessBridge>) -> Vec<ScriptRecord> {
        interop
            .bridge()
            .records()
            .into_iter()
            .filter(|r| r.source.contains("createElement('script')"))
            .collect()
    }

    #[test]
    fn test_concurrent_loads_share_one_request() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        loader.load_script("lib.js", tag("first"), tag("first-failed"));
        loader.load_script("lib.js", tag("second"), tag("second-failed"));
        assert_eq!(loader.status("lib.js"), LoadStatus::Pending(2));

        let loads = script_loads(&interop);
        assert_eq!(loads.len(), 1);
        assert!(seen.borrow().is_empty());

        interop.bridge().invoke(loads[0].callbacks[0], vec![]);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
        assert_eq!(loader.status("lib.js"), LoadStatus::Loaded);

        loader.load_script("lib.js", tag("third"), tag("third-failed"));
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
        assert_eq!(script_loads(&interop).len(), 1);
    }

    #[test]
    fn test_completion_proxies_are_released() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        loader.load_script("lib.js", || {}, || {});
        assert_eq!(interop.context().callbacks.len(), 2);

        loader.on_script_load_success("lib.js");
        assert!(interop.context().callbacks.is_empty());
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        loader.load_script("flaky.js", tag("ok"), tag("failed"));
        loader.load_script("flaky.js", tag("ok-2"), tag("failed-2"));
        let first = script_loads(&interop)[0].clone();
        interop.bridge().invoke(first.callbacks[1], vec![]);

        assert_eq!(*seen.borrow(), vec!["failed", "failed-2"]);
        assert_eq!(loader.status("flaky.js"), LoadStatus::NotStarted);

        loader.load_script("flaky.js", tag("ok-3"), tag("failed-3"));
        let loads = script_loads(&interop);
        assert_eq!(loads.len(), 2);
        interop.bridge().invoke(loads[1].callbacks[0], vec![]);
        assert_eq!(*seen.borrow(), vec!["failed", "failed-2", "ok-3"]);
    }

    #[test]
    fn test_url_spellings_share_state() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        loader.load_script("ms-appx:///app/lib.js", || {}, || {});
        loader.load_script("  app/lib.js ", || {}, || {});
        assert_eq!(loader.status("ms-appx:/app/lib.js"), LoadStatus::Pending(2));
        assert_eq!(script_loads(&interop).len(), 1);
        assert_eq!(normalize_url("ms-appx:///x.css"), "x.css");
    }

    #[test]
    fn test_waiter_added_while_firing_success_is_satisfied() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        let inner = loader.clone();
        let late = tag("late");
        let late_failed = tag("late-failed");
        let late = Rc::new(late);
        let late_failed = Rc::new(late_failed);
        loader.load_script(
            "lib.js",
            move || {
                let (l, f) = (late.clone(), late_failed.clone());
                inner.load_script("lib.js", move || l(), move || f());
            },
            || {},
        );
        loader.on_script_load_success("lib.js");

        assert_eq!(*seen.borrow(), vec!["late"]);
        assert_eq!(script_loads(&interop).len(), 1);
    }

    #[test]
    fn test_script_batch_loads_in_order() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        loader.load_scripts(["a.js", "b.js"], tag("done"), tag("error"));
        let loads = script_loads(&interop);
        assert_eq!(loads.len(), 1);
        assert!(loads[0].source.contains("\"a.js\""));

        loader.on_script_load_success("a.js");
        let loads = script_loads(&interop);
        assert_eq!(loads.len(), 2);
        assert!(loads[1].source.contains("\"b.js\""));
        assert!(seen.borrow().is_empty());

        loader.on_script_load_success("b.js");
        assert_eq!(*seen.borrow(), vec!["done"]);
    }

    #[test]
    fn test_script_batch_abandons_after_failure() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        loader.load_scripts(["a.js", "b.js", "c.js"], tag("done"), tag("error"));
        loader.on_script_load_success("a.js");
        loader.on_script_load_failure("b.js");

        assert_eq!(*seen.borrow(), vec!["error"]);
        assert!(
            !interop
                .bridge()
                .sources()
                .iter()
                .any(|s| s.contains("c.js"))
        );
        assert_eq!(loader.status("c.js"), LoadStatus::NotStarted);
    }

    #[test]
    fn test_empty_batches_complete_immediately() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();
        loader.load_scripts(Vec::<String>::new(), tag("scripts"), tag("error"));
        loader.load_styles(Vec::<String>::new(), tag("styles"));
        assert_eq!(*seen.borrow(), vec!["scripts", "styles"]);
        assert!(interop.bridge().records().is_empty());
    }

    #[test]
    fn test_style_batch_advances_on_completion() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        let (seen, tag) = recorder();

        loader.load_styles(["x.css", "y.css"], tag("done"));
        let first = interop.bridge().records();
        assert_eq!(first.len(), 1);
        assert!(first[0].source.contains("'stylesheet'"));

        interop.bridge().invoke(first[0].callbacks[0], vec![]);
        // A repeated error event from the same element is ignored.
        interop.bridge().invoke(first[0].callbacks[0], vec![]);
        let records = interop.bridge().records();
        assert_eq!(records.len(), 2);
        assert!(records[1].source.contains("\"y.css\""));

        interop.bridge().invoke(records[1].callbacks[0], vec![]);
        assert_eq!(*seen.borrow(), vec!["done"]);
    }

    #[test]
    fn test_reset_forgets_everything() {
        let interop = headless();
        let loader = ResourceLoader::new(interop.clone());
        loader.load_script("a.js", || {}, || {});
        loader.on_script_load_success("a.js");
        loader.load_script("b.js", || {}, || {});

        loader.reset();
        assert_eq!(loader.status("a.js"), LoadStatus::NotStarted);
        assert_eq!(loader.status("b.js"), LoadStatus::NotStarted);
        assert!(interop.context().callbacks.is_empty());
    }

    // Render surface

    #[test]
    fn test_surface_calls() {
        let surface = ScriptSurface::new(headless());
        let el = surface.create_element("div", None).unwrap();
        surface.set_style(&el, "objectFit", "contain").unwrap();
        surface.set_attribute(&el, "alt", "logo").unwrap();
        surface.stop_animation(&el, "run-3").unwrap();
        surface.flush();

        let sources = surface.interop().bridge().sources();
        insta::assert_snapshot!(&sources[1], @r#"trellis.refs[1].style["objectFit"] = "contain";"#);
        insta::assert_snapshot!(&sources[2], @r#"trellis.refs[1].setAttribute("alt", "logo");"#);
        insta::assert_snapshot!(&sources[3], @r#"Velocity(trellis.refs[1], "stop", "run-3");"#);
    }

    #[test]
    fn test_native_animation_call() {
        let surface = ScriptSurface::new(headless());
        let el = surface.create_element("div", None).unwrap();
        let done = Rc::new(RefCell::new(0));
        let d = done.clone();

        surface
            .run_animation(NativeAnimation {
                element: el,
                duration: 250.0,
                easing: EasingDescriptor::Named("linear"),
                group: "run-1".into(),
                properties: vec![AnimatedProperty {
                    name: "opacity".into(),
                    to: CssValue::Number(1.0),
                    from: Some(CssValue::Number(0.0)),
                }],
                on_complete: Some(Box::new(move || *d.borrow_mut() += 1)),
            })
            .unwrap();
        surface.flush();

        let bridge = surface.interop().bridge();
        let sources = bridge.sources();
        insta::assert_snapshot!(
            &sources[1],
            @r#"Velocity(trellis.refs[1], {"opacity": [1, 0]}, { duration: 250, easing: "linear", queue: "run-1", complete: trellis.callback(1) }); Velocity.Utilities.dequeue(trellis.refs[1], "run-1");"#
        );

        assert_eq!(bridge.complete_animations(), 1);
        assert_eq!(bridge.complete_animations(), 0);
        assert_eq!(*done.borrow(), 1);
        assert!(surface.interop().context().callbacks.is_empty());
    }

    #[test]
    fn test_spring_easing_is_a_pair() {
        let surface = ScriptSurface::new(headless());
        let el = surface.create_element("div", None).unwrap();
        surface
            .run_animation(NativeAnimation {
                element: el,
                duration: 100.0,
                easing: EasingDescriptor::Spring {
                    tension: 500.0,
                    friction: 20.0,
                },
                group: "g".into(),
                properties: vec![AnimatedProperty {
                    name: "width".into(),
                    to: CssValue::Text("40px".into()),
                    from: None,
                }],
                on_complete: None,
            })
            .unwrap();
        surface.flush();
        let sources = surface.interop().bridge().sources();
        let src = &sources[1];
        assert!(src.contains(r#"{"width": "40px"}"#));
        assert!(src.contains("easing: [500, 20]"));
        assert!(src.contains("complete: null"));
    }

    #[test]
    fn test_natural_size_query() {
        let surface = ScriptSurface::new(headless());
        surface.interop().bridge().respond(|src| {
            src.contains("naturalWidth")
                .then(|| Ok(BridgeValue::String("320|200".into())))
        });
        let img = surface.create_element("img", None).unwrap();
        assert_eq!(surface.natural_size(&img).unwrap(), Size::new(320.0, 200.0));

        assert_eq!(parse_natural_size("garbage"), Size::ZERO);
        assert_eq!(parse_natural_size("12.5|x"), Size::new(12.5, 0.0));
        assert_eq!(parse_natural_size(" 3 | 4 "), Size::new(3.0, 4.0));
    }

    #[test]
    fn test_bind_event_and_dispose() {
        let surface = ScriptSurface::new(headless());
        let img = surface.create_element("img", None).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let dispose = surface
            .bind_event(&img, "load", Rc::new(move || *h.borrow_mut() += 1))
            .unwrap();
        surface.flush();

        let bridge = surface.interop().bridge();
        let proxy = bridge.records()[1].callbacks[0];
        bridge.invoke(proxy, vec![]);
        assert_eq!(*hits.borrow(), 1);

        dispose.run();
        surface.flush();
        assert!(bridge.sources()[2].contains("removeEventListener(\"load\""));
        bridge.invoke(proxy, vec![]);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_element_lookup() {
        let surface = ScriptSurface::new(headless());
        surface.interop().bridge().respond(|src| {
            src.contains("\"missing\"").then(|| Ok(BridgeValue::Null))
        });
        assert!(surface.element_by_id("host").unwrap().is_some());
        assert!(surface.element_by_id("missing").unwrap().is_none());
    }
}
