#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const BUTTON_COMPONENT: &str =
	"import QtQuick 2.0\n\nButton {\n    property int width: 10\n    color: \"blue\"\n}\n";

pub const PANEL_COMPONENT: &str = "import QtQuick 2.0\n\nRectangle {\n    width: 100\n}\n";

pub const MAIN_DOCUMENT: &str = "import QtQuick 2.0\n\nItem {\n    @Button {\n        width: \
                                 20\n    }\n    @Panel {\n    }\n}\n";

pub fn qmlsplice_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("qmlsplice"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("QMLSPLICE_LOG");
	cmd
}

/// Write the two components and the source document into `root`.
pub fn write_project(root: &Path) -> std::io::Result<()> {
	std::fs::write(root.join("Button.qml"), BUTTON_COMPONENT)?;
	std::fs::write(root.join("Panel.qml"), PANEL_COMPONENT)?;
	std::fs::write(root.join("main.original.qml"), MAIN_DOCUMENT)
}
