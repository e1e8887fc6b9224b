//! Layout engines that wrap another engine and adjust its input or output.
//!
//! A proxy forwards every update to its inner engine. When the inner engine
//! comes back unchanged the proxy reports no change either, so the "same
//! handle means no-op" contract holds through any depth of wrapping.

mod bar;
mod floating;
mod gaps;

use std::rc::Rc;

use tracing::warn;

pub use bar::BarEngine;
pub use floating::FloatingEngine;
pub use gaps::GapsEngine;

use super::Engine;
use crate::common::config::{LayoutSettings, ProxyKind};
use crate::sys::window_server::WindowServer;

/// Wraps an engine in a proxy.
pub type ProxyLayoutEngine = Box<dyn Fn(Engine) -> Engine>;

/// Proxy factories for a workspace, innermost first. Configuration lists
/// proxies outermost first.
///
/// The floating proxy always ends up outermost: floating windows keep their
/// live frame and no other proxy may adjust it.
pub fn proxies_from_settings(
    settings: &LayoutSettings,
    server: Rc<dyn WindowServer>,
) -> Vec<ProxyLayoutEngine> {
    if settings.proxies.iter().skip(1).any(|kind| *kind == ProxyKind::Floating) {
        warn!(proxies = ?settings.proxies, "moving the floating proxy outermost");
    }
    let floating = settings.proxies.iter().filter(|kind| **kind == ProxyKind::Floating).take(1);
    settings
        .proxies
        .iter()
        .filter(|kind| **kind != ProxyKind::Floating)
        .rev()
        .chain(floating)
        .map(|kind| -> ProxyLayoutEngine {
            match *kind {
                ProxyKind::Gaps => {
                    let gaps = settings.gaps;
                    Box::new(move |inner| Engine::new(GapsEngine::new(gaps, inner)))
                }
                ProxyKind::Bar => {
                    let bar = settings.bar;
                    Box::new(move |inner| Engine::new(BarEngine::new(bar, inner)))
                }
                ProxyKind::Floating => {
                    let server = server.clone();
                    Box::new(move |inner| Engine::new(FloatingEngine::new(server.clone(), inner)))
                }
            }
        })
        .collect()
}
