// SPDX-License-Identifier: MIT OR Apache-2.0
//! Natron Curve Editor - standalone animation curve editor
//!
//! A desktop window hosting the curve editor view:
//! - Grid with adaptive ticks and labels
//! - Keyframe selection, dragging and bounding box scaling
//! - Tangent editing
//! - Loop, negate and reverse expressions
//!
//! ## Architecture
//!
//! The application owns the window and the GPU surface. All editing lives
//! in `natron_editor_curve_view`, which is rendered with egui on top of
//! wgpu.

mod app;
mod demo;

use app::CurveEditorApp;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directives added on top of `RUST_LOG`
const DEFAULT_DIRECTIVES: [&str; 4] = [
    "natron_editor_app=debug",
    "natron_editor_curve_view=info",
    "wgpu=warn",
    "naga=warn",
];

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive '{directive}': {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Natron Curve Editor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = CurveEditorApp::run() {
        tracing::error!("Curve editor crashed: {e}");
        std::process::exit(1);
    }
}
