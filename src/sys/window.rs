use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Raw RGBA pixels of a window icon, as handed out by the window server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Capabilities the layout core needs from an on-screen window. Implemented
/// by the windowing-system bindings.
pub trait Window: fmt::Debug {
    fn title(&self) -> String;
    fn focus(&self);
    fn hide(&self);
    fn show_minimized(&self);
    /// True while the user is dragging the window.
    fn is_mouse_moving(&self) -> bool;
    fn icon(&self) -> Option<Icon>;
}

/// Non-owning handle to a window. Two handles are equal only when they point
/// at the same window object.
#[derive(Clone)]
pub struct WindowRef(Rc<dyn Window>);

impl WindowRef {
    pub fn new<W: Window + 'static>(window: Rc<W>) -> Self { Self(window) }

    fn addr(&self) -> *const () { Rc::as_ptr(&self.0) as *const () }
}

impl std::ops::Deref for WindowRef {
    type Target = dyn Window;

    fn deref(&self) -> &Self::Target { &*self.0 }
}

impl PartialEq for WindowRef {
    fn eq(&self, other: &Self) -> bool { std::ptr::eq(self.addr(), other.addr()) }
}

impl Eq for WindowRef {}

impl Hash for WindowRef {
    fn hash<H: Hasher>(&self, state: &mut H) { self.addr().hash(state) }
}

impl fmt::Debug for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0.title()) }
}
