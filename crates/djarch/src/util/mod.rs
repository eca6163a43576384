mod drag_handler;
pub use drag_handler::{
    Commit, DragEffect, DragHandler, DragMode, DragState, Draft, NoCapture, PointerCapture,
    PointerEvent, PointerId, RESIZE_HANDLE_PX, Viewport, hit_test,
};
