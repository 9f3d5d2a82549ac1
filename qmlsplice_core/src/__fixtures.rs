use std::cell::RefCell;

use crate::ComponentBody;
use crate::MergeEvent;
use crate::MergeReporter;

pub const BUTTON_COMPONENT: &str = "import QtQuick 2.0\n\nButton {\n    property int width: \
                                    10\n    color: \"blue\"\n}\n";

pub const PANEL_COMPONENT: &str = "import QtQuick 2.0\nimport QtQuick.Controls 2.0\n\nRectangle \
                                   {\n    width: 100\n    Text {\n        width: 50\n        \
                                   text: \"label\"\n    }\n    color: \"red\"\n}\n";

pub fn button() -> ComponentBody {
	ComponentBody::from_source(BUTTON_COMPONENT)
}

pub fn panel() -> ComponentBody {
	ComponentBody::from_source(PANEL_COMPONENT)
}

/// Collects the display text of every reported event.
#[derive(Debug, Default)]
pub struct RecordingReporter {
	events: RefCell<Vec<String>>,
}

impl RecordingReporter {
	pub fn events(&self) -> Vec<String> {
		self.events.borrow().clone()
	}

	pub fn contains(&self, needle: &str) -> bool {
		self.events.borrow().iter().any(|event| event.contains(needle))
	}
}

impl MergeReporter for RecordingReporter {
	fn report(&self, event: &MergeEvent<'_>) {
		self.events.borrow_mut().push(event.to_string());
	}
}
