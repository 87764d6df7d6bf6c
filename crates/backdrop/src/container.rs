//! The host element an effect is mounted into.
//!
//! A container reports its bounds and delivers pointer-move and resize
//! notifications. Listeners are registered through [`Subscription`] handles;
//! dropping the handle detaches the listener, so every exit path of a mount
//! (including a failed initialisation) unsubscribes deterministically.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::surface::SurfaceSize;

/// Bounding rectangle in the same coordinate space as pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_size(size: SurfaceSize) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }
}

/// A raw pointer sample together with the container bounds at event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMove {
    pub x: f32,
    pub y: f32,
    pub bounds: Rect,
}

pub type PointerListener = Box<dyn FnMut(PointerMove)>;
pub type ResizeListener = Box<dyn FnMut(SurfaceSize)>;

pub trait Container {
    fn bounding_rect(&self) -> Rect;

    fn pixel_size(&self) -> SurfaceSize;

    fn on_pointer_move(&self, listener: PointerListener) -> Subscription;

    fn on_resize(&self, listener: ResizeListener) -> Subscription;
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    pointer: Vec<(u64, PointerListener)>,
    resize: Vec<(u64, ResizeListener)>,
}

/// Listener registry a host embeds in its container implementation.
///
/// Listeners must not subscribe or unsubscribe from inside a dispatch.
#[derive(Default, Clone)]
pub struct EventHub {
    inner: Rc<RefCell<Listeners>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_pointer(&self, listener: PointerListener) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.pointer.push((id, listener));
        Subscription::new(&self.inner, id)
    }

    pub fn subscribe_resize(&self, listener: ResizeListener) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.resize.push((id, listener));
        Subscription::new(&self.inner, id)
    }

    pub fn dispatch_pointer(&self, event: PointerMove) {
        for (_, listener) in self.inner.borrow_mut().pointer.iter_mut() {
            listener(event);
        }
    }

    pub fn dispatch_resize(&self, size: SurfaceSize) {
        for (_, listener) in self.inner.borrow_mut().resize.iter_mut() {
            listener(size);
        }
    }

    pub fn listener_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.pointer.len() + inner.resize.len()
    }
}

/// Scoped registration of one listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    hub: Weak<RefCell<Listeners>>,
    id: u64,
}

impl Subscription {
    fn new(hub: &Rc<RefCell<Listeners>>, id: u64) -> Self {
        Self {
            hub: Rc::downgrade(hub),
            id,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.hub
            .upgrade()
            .map(|hub| {
                let listeners = hub.borrow();
                listeners.pointer.iter().any(|(id, _)| *id == self.id)
                    || listeners.resize.iter().any(|(id, _)| *id == self.id)
            })
            .unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            let mut listeners = hub.borrow_mut();
            listeners.pointer.retain(|(id, _)| *id != self.id);
            listeners.resize.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Container without a window behind it; events are injected by the caller.
pub struct VirtualContainer {
    bounds: Cell<Rect>,
    hub: EventHub,
}

impl VirtualContainer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            bounds: Cell::new(Rect::from_size(size)),
            hub: EventHub::new(),
        }
    }

    pub fn with_bounds(bounds: Rect) -> Self {
        Self {
            bounds: Cell::new(bounds),
            hub: EventHub::new(),
        }
    }

    /// Delivers a pointer move at container-space coordinates.
    pub fn move_pointer(&self, x: f32, y: f32) {
        self.hub.dispatch_pointer(PointerMove {
            x,
            y,
            bounds: self.bounds.get(),
        });
    }

    /// Moves the pointer to a position given as fractions of the bounds.
    pub fn move_pointer_relative(&self, fx: f32, fy: f32) {
        let bounds = self.bounds.get();
        self.move_pointer(
            bounds.left + bounds.width * fx,
            bounds.top + bounds.height * fy,
        );
    }

    pub fn resize(&self, size: SurfaceSize) {
        let bounds = self.bounds.get();
        self.bounds.set(Rect::new(
            bounds.left,
            bounds.top,
            size.width as f32,
            size.height as f32,
        ));
        self.hub.dispatch_resize(size);
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }
}

impl Container for VirtualContainer {
    fn bounding_rect(&self) -> Rect {
        self.bounds.get()
    }

    fn pixel_size(&self) -> SurfaceSize {
        let bounds = self.bounds.get();
        SurfaceSize::new(
            bounds.width.max(0.0).round() as u32,
            bounds.height.max(0.0).round() as u32,
        )
    }

    fn on_pointer_move(&self, listener: PointerListener) -> Subscription {
        self.hub.subscribe_pointer(listener)
    }

    fn on_resize(&self, listener: ResizeListener) -> Subscription {
        self.hub.subscribe_resize(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_subscription_detaches_listener() {
        let hub = EventHub::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let subscription = hub.subscribe_resize(Box::new(move |_| counter.set(counter.get() + 1)));

        hub.dispatch_resize(SurfaceSize::new(1, 1));
        assert!(subscription.is_attached());
        drop(subscription);
        hub.dispatch_resize(SurfaceSize::new(2, 2));

        assert_eq!(hits.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_hub_is_harmless() {
        let hub = EventHub::new();
        let subscription = hub.subscribe_pointer(Box::new(|_| {}));
        drop(hub);
        assert!(!subscription.is_attached());
        drop(subscription);
    }

    #[test]
    fn virtual_container_reports_relative_pointer() {
        let container = VirtualContainer::with_bounds(Rect::new(100.0, 50.0, 200.0, 100.0));
        let seen = Rc::new(Cell::new(None));
        let slot = seen.clone();
        let _subscription =
            container.on_pointer_move(Box::new(move |event| slot.set(Some((event.x, event.y)))));

        container.move_pointer_relative(0.5, 0.25);
        assert_eq!(seen.get(), Some((200.0, 75.0)));
    }

    #[test]
    fn resize_updates_bounds_and_notifies() {
        let container = VirtualContainer::new(SurfaceSize::new(10, 10));
        let seen = Rc::new(Cell::new(SurfaceSize::default()));
        let slot = seen.clone();
        let _subscription = container.on_resize(Box::new(move |size| slot.set(size)));

        container.resize(SurfaceSize::new(300, 150));
        assert_eq!(seen.get(), SurfaceSize::new(300, 150));
        assert_eq!(container.pixel_size(), SurfaceSize::new(300, 150));
    }
}
