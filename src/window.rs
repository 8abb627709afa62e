use parking_lot::RwLock;

/// Contract the real window/swap-chain subsystem fulfils for the engine.
pub trait WindowProxy: Send + Sync {
    fn resize(&self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn set_ui_visible(&self, show: bool);
    fn ui_visible(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    width: u32,
    height: u32,
    show_ui: bool,
}

/// Stand-in window used by headless embeddings and tests.
#[derive(Debug)]
pub struct StaticWindow {
    state: RwLock<WindowState>,
}

impl StaticWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: RwLock::new(WindowState {
                width: width.max(1),
                height: height.max(1),
                show_ui: true,
            }),
        }
    }
}

impl WindowProxy for StaticWindow {
    fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.write();
        state.width = width.max(1);
        state.height = height.max(1);
    }

    fn size(&self) -> (u32, u32) {
        let state = self.state.read();
        (state.width, state.height)
    }

    fn set_ui_visible(&self, show: bool) {
        self.state.write().show_ui = show;
    }

    fn ui_visible(&self) -> bool {
        self.state.read().show_ui
    }
}
