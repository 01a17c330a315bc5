use std::collections::HashMap;

use dbrb_rs::{
    types::{
        basic::{ProcessId, Timestamp},
        view::View,
    },
    view_supplier::ViewSupplier,
};

/// A view supplier that hands out fixed views, regardless of time.
pub(crate) struct MockViewSupplier {
    pub(crate) view: View,
    pub(crate) bootstrap_view: View,
    pub(crate) expiration_times: HashMap<ProcessId, Timestamp>,
}

impl MockViewSupplier {
    pub(crate) fn new(view: View, bootstrap_view: View) -> MockViewSupplier {
        MockViewSupplier {
            view,
            bootstrap_view,
            expiration_times: HashMap::new(),
        }
    }

    pub(crate) fn with_expiration_time(mut self, process: ProcessId, expiration_time: Timestamp) -> Self {
        self.expiration_times.insert(process, expiration_time);
        self
    }
}

impl ViewSupplier for MockViewSupplier {
    fn view(&self, _: Timestamp) -> View {
        self.view.clone()
    }

    fn bootstrap_view(&self) -> View {
        self.bootstrap_view.clone()
    }

    fn expiration_time(&self, process: &ProcessId) -> Option<Timestamp> {
        self.expiration_times.get(process).copied()
    }
}
