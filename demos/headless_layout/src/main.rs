use std::time::Duration;

use trellis_core::Size;
use trellis_interop::BridgeValue;
use trellis_platform::{RuntimeOptions, launch_headless};
use trellis_ui::{DoubleAnimation, Orientation, Stretch};

fn main() -> anyhow::Result<()> {
    let options = match std::env::args().nth(1) {
        Some(path) => RuntimeOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => RuntimeOptions {
            log_level: "debug".into(),
            ..RuntimeOptions::default()
        },
    };
    let mut runtime = launch_headless(options)?;

    let bridge = runtime.interop().bridge();
    bridge.respond(|src| (src == "document.body").then(|| Ok(BridgeValue::Object(0))));
    bridge.respond(|src| {
        src.contains("naturalWidth")
            .then(|| Ok(BridgeValue::String("320|240".into())))
    });

    let tree = runtime.tree_mut();
    let root = tree.stack(Orientation::Horizontal);
    let logo = tree.image("logo.png");
    tree.set_stretch(logo, Stretch::Uniform)?;
    let spacer = tree.fixed(Size::new(16.0, 16.0));
    tree.append_child(root, logo)?;
    tree.append_child(root, spacer)?;

    runtime.mount(root)?;
    runtime.render(Size::new(800.0, 120.0))?;
    log::info!("logo laid out at {:?}", runtime.tree().rect(logo)?);

    let target = runtime.tree().animation_target(logo)?;
    runtime.animator().begin(
        target,
        "Opacity",
        DoubleAnimation::to(1.0, Duration::from_millis(300)).starting_from(0.0),
    )?;
    let completed = runtime.interop().bridge().complete_animations();
    log::info!("{completed} native animation(s) completed");

    for source in runtime.interop().bridge().sources() {
        println!("{source}");
    }
    Ok(())
}
