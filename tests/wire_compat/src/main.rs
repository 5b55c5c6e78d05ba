fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use systray_protocol::{
        Action, ClickedEvent, Event, Menu, MenuItem, WireAction, WireMenu, decode_line,
        encode_action, encode_menu,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  helper: {fixture}\n  Rust:   {reserialized}"
        );
    }

    /// A fixture collapsed onto one line, as it travels on the wire.
    fn wire_line(name: &str) -> String {
        load_fixture(name).to_string()
    }

    fn numbered(mut item: MenuItem, id: u32) -> MenuItem {
        item.set_identifier(id);
        item
    }

    // --- Helper -> host ---

    #[test]
    fn fixture_ready() {
        roundtrip_test::<Event>("ready.json");
        assert_eq!(decode_line(&wire_line("ready.json")).unwrap(), Event::Ready);
    }

    #[test]
    fn fixture_clicked() {
        roundtrip_test::<Event>("clicked.json");

        let Event::Clicked(ClickedEvent {
            item,
            seq_id,
            identifier,
        }) = decode_line(&wire_line("clicked.json")).unwrap()
        else {
            panic!("expected clicked");
        };
        assert_eq!(identifier, Some(1));
        assert_eq!(seq_id, 0);
        assert_eq!(item.title.as_deref(), Some("Item 1"));
        assert_eq!(item.checked, Some(true));
    }

    #[test]
    fn pretty_fixture_is_not_a_single_line() {
        // Multi-line JSON never appears on the wire; each line alone is not JSON.
        let raw = read_fixture("clicked.json");
        let first = raw.lines().next().unwrap();
        assert!(decode_line(first).is_err());
    }

    // --- Host -> helper ---

    #[test]
    fn fixture_update_item() {
        roundtrip_test::<WireAction>("update_item.json");

        let action = Action::UpdateItem {
            item: numbered(MenuItem::new("Item 1", "first item").with_checked(false), 1),
            seq_id: None,
        };
        let encoded: serde_json::Value =
            serde_json::from_str(&encode_action(&action).unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("update_item.json"));
    }

    #[test]
    fn fixture_update_menu() {
        roundtrip_test::<WireAction>("update_menu.json");

        let parent = numbered(MenuItem::new("Parent", ""), 1).with_items(vec![numbered(
            MenuItem::new("Child", "")
                .with_checked(true)
                .with_enabled(false)
                .with_extra("host_only", 42),
            2,
        )]);
        let action = Action::UpdateMenu {
            menu: Menu {
                icon: "aWNvbg==".into(),
                title: "Title".into(),
                tooltip: "Tooltip".into(),
                is_template_icon: None,
                items: vec![parent, numbered(MenuItem::separator(), 3)],
            },
        };
        let encoded: serde_json::Value =
            serde_json::from_str(&encode_action(&action).unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("update_menu.json"));
    }

    #[test]
    fn fixture_update_menu_and_item() {
        roundtrip_test::<WireAction>("update_menu_and_item.json");

        let mut item = numbered(MenuItem::new("Item 1", ""), 1);
        item.hidden = Some(true);
        let action = Action::UpdateMenuAndItem {
            menu: Menu {
                title: "Title".into(),
                tooltip: "Tooltip".into(),
                is_template_icon: Some(true),
                items: vec![item.clone()],
                ..Menu::default()
            },
            item,
            seq_id: Some(4),
        };
        let encoded: serde_json::Value =
            serde_json::from_str(&encode_action(&action).unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("update_menu_and_item.json"));
    }

    #[test]
    fn fixture_exit() {
        roundtrip_test::<WireAction>("exit.json");
        assert_eq!(encode_action(&Action::Exit).unwrap(), wire_line("exit.json"));
    }

    #[test]
    fn fixture_initial_menu() {
        roundtrip_test::<WireMenu>("initial_menu.json");

        let menu = Menu {
            title: "Title".into(),
            tooltip: "Tooltip".into(),
            items: vec![
                numbered(
                    MenuItem::new("Item 1", "first item")
                        .with_checked(false)
                        .with_extra("callback", "noop"),
                    1,
                ),
                numbered(MenuItem::new("Quit", ""), 2),
            ],
            ..Menu::default()
        };
        let encoded: serde_json::Value =
            serde_json::from_str(&encode_menu(&menu).unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("initial_menu.json"));
    }
}
