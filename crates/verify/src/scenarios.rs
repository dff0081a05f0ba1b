//! Built-in verification scenarios
//!
//! The four flows verified against the marXiv UI. Selectors and literal
//! texts are fixed data; addresses, viewports, and timeouts come from the
//! runner configuration.

use crate::scenario::{AttributeCheck, ElementState, Locator, Scenario, Step, Viewport};

/// All built-in scenarios, in a stable order.
pub fn all() -> Vec<Scenario> {
    vec![
        category_filter(),
        mobile_menu(),
        note_reorder(),
        theme_switch(),
    ]
}

/// Looks up a built-in scenario by name.
pub fn by_name(name: &str) -> Option<Scenario> {
    all().into_iter().find(|s| s.name == name)
}

/// Typing into the category search narrows the visible category sections
/// to the matching one; the incremental-search dropdown offers the match.
pub fn category_filter() -> Scenario {
    Scenario {
        name: "category-filter".into(),
        description: "Filtering categories hides non-matching sections".into(),
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps: vec![
            Step::Navigate {
                path: "/categories".into(),
                wait_for: Some(Locator::with_text("h1, h2", "All Categories")),
            },
            // Hydration signal: the search field is interactive.
            Step::WaitFor {
                locator: Locator::css(r#"input[type="search"]"#),
                state: ElementState::Visible,
                timeout_ms: None,
            },
            Step::TypeText {
                locator: Locator::css(r#"input[type="search"]"#),
                text: "Robotics".into(),
                delay_ms: None,
            },
            Step::WaitFor {
                locator: Locator::with_text("button", "Robotics"),
                state: ElementState::Visible,
                timeout_ms: None,
            },
            Step::Capture {
                name: "categories_dropdown".into(),
                full_page: false,
            },
            Step::Press { key: "Enter".into() },
            Step::Assert {
                locator: Locator::with_text("h2, h3", "Computer Science"),
                visible: Some(true),
                text_equals: None,
                text_contains: None,
                attribute: None,
            },
            Step::Assert {
                locator: Locator::with_text("h2, h3", "Physics"),
                visible: Some(false),
                text_equals: None,
                text_contains: None,
                attribute: None,
            },
            Step::Assert {
                locator: Locator::with_text("h2, h3", "Robotics"),
                visible: Some(true),
                text_equals: None,
                text_contains: None,
                attribute: None,
            },
            Step::Capture {
                name: "categories_filtered".into(),
                full_page: false,
            },
        ],
    }
}

/// At a phone-sized viewport the hamburger replaces the desktop
/// navigation, and tapping it opens the drawer.
pub fn mobile_menu() -> Scenario {
    Scenario {
        name: "mobile-menu".into(),
        description: "Narrow viewport shows the hamburger and opens the drawer".into(),
        viewport: Viewport {
            width: 375,
            height: 667,
        },
        steps: vec![
            Step::Navigate {
                path: "/".into(),
                wait_for: Some(Locator::with_text("a", "marXiv")),
            },
            Step::Assert {
                locator: Locator::with_text("button", "Open Menu"),
                visible: Some(true),
                text_equals: None,
                text_contains: None,
                attribute: None,
            },
            // The desktop Categories link must be collapsed away.
            Step::Assert {
                locator: Locator::with_text("header a", "Categories"),
                visible: Some(false),
                text_equals: None,
                text_contains: None,
                attribute: None,
            },
            Step::Click {
                locator: Locator::with_text("button", "Open Menu"),
            },
            Step::WaitFor {
                locator: Locator::with_text("span", "Menu"),
                state: ElementState::Visible,
                timeout_ms: None,
            },
            Step::Capture {
                name: "mobile_menu_open".into(),
                full_page: false,
            },
        ],
    }
}

/// Adds "Note 1" and "Note 2" to a paper, drags the first card past the
/// second, and expects the display order to invert.
pub fn note_reorder() -> Scenario {
    let mut steps = vec![
        Step::Navigate {
            path: "/paper/2106.09685".into(),
            wait_for: Some(Locator::css("h1")),
        },
        Step::ScrollBy { x: 0, y: 500 },
    ];

    for note in ["Note 1", "Note 2"] {
        steps.push(Step::Click {
            locator: Locator::with_text("button", "Add Note"),
        });
        steps.push(Step::TypeText {
            locator: Locator::with_text("textarea", "Type your note here..."),
            text: note.into(),
            delay_ms: Some(20),
        });
        steps.push(Step::Click {
            locator: Locator::with_text("button", "Add Note"),
        });
        steps.push(Step::WaitFor {
            locator: Locator::with_text(".group", note),
            state: ElementState::Visible,
            timeout_ms: None,
        });
    }

    steps.extend([
        // Reveal the grab handle, which only shows on hover.
        Step::Hover {
            locator: Locator::nth(".group", 0),
        },
        Step::Drag {
            source: Locator::nth(".group .cursor-grab", 0),
            target: Locator::nth(".group", 1),
        },
        Step::Assert {
            locator: Locator::nth(".group", 0),
            visible: Some(true),
            text_equals: None,
            text_contains: Some("Note 2".into()),
            attribute: None,
        },
        Step::Capture {
            name: "note_reorder".into(),
            full_page: false,
        },
    ]);

    Scenario {
        name: "note-reorder".into(),
        description: "Dragging the first note below the second inverts the order".into(),
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps,
    }
}

/// Applies two theme/font pairs in sequence and reads the applied state
/// back off the document element, so nothing of the first selection can
/// linger after the second.
pub fn theme_switch() -> Scenario {
    let mut steps = vec![
        Step::Navigate {
            path: "/".into(),
            wait_for: Some(Locator::with_text("button", "Theme Settings")),
        },
        Step::Click {
            locator: Locator::with_text("button", "Theme Settings"),
        },
        Step::WaitFor {
            locator: Locator::with_text("h3", "Appearance"),
            state: ElementState::Visible,
            timeout_ms: None,
        },
    ];

    for (theme_label, theme_id, font_label, font_id, shot) in [
        ("Swiss", "swiss", "Editorial", "editorial", "themes_swiss_editorial"),
        ("Amber", "amber-crt", "Raw", "raw", "themes_amber_raw"),
    ] {
        steps.extend([
            Step::Click {
                locator: Locator::with_text("button", theme_label),
            },
            Step::Click {
                locator: Locator::with_text("button", font_label),
            },
            Step::Assert {
                locator: Locator::css("html"),
                visible: None,
                text_equals: None,
                text_contains: None,
                attribute: Some(AttributeCheck {
                    name: "data-theme".into(),
                    value: theme_id.into(),
                }),
            },
            Step::Assert {
                locator: Locator::css("html"),
                visible: None,
                text_equals: None,
                text_contains: None,
                attribute: Some(AttributeCheck {
                    name: "data-font".into(),
                    value: font_id.into(),
                }),
            },
            Step::Capture {
                name: shot.into(),
                full_page: true,
            },
        ]);
    }

    Scenario {
        name: "theme-switch".into(),
        description: "Theme and font selections apply and do not leak between switches".into(),
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_builtins_with_unique_names() {
        let scenarios = all();
        assert_eq!(scenarios.len(), 4);

        let mut names: Vec<_> = scenarios.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);

        assert!(by_name("note-reorder").is_some());
        assert!(by_name("no-such-scenario").is_none());
    }

    #[test]
    fn every_builtin_starts_with_navigate() {
        for scenario in all() {
            assert!(
                matches!(scenario.steps.first(), Some(Step::Navigate { .. })),
                "{} must navigate first",
                scenario.name
            );
        }
    }

    #[test]
    fn mobile_menu_uses_narrow_viewport() {
        let scenario = mobile_menu();
        assert_eq!(scenario.viewport.width, 375);
        assert_eq!(scenario.viewport.height, 667);
    }

    #[test]
    fn note_reorder_encodes_the_regression_case() {
        // Add "Note 1" then "Note 2", drag, and expect "Note 2" first.
        let scenario = note_reorder();

        let typed: Vec<_> = scenario
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::TypeText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(typed, vec!["Note 1", "Note 2"]);

        assert!(scenario
            .steps
            .iter()
            .any(|s| matches!(s, Step::Drag { .. })));

        let inverted = scenario.steps.iter().any(|s| {
            matches!(
                s,
                Step::Assert {
                    locator,
                    text_contains: Some(text),
                    ..
                } if locator.nth == 0 && text == "Note 2"
            )
        });
        assert!(inverted, "must assert the first card now reads Note 2");
    }

    #[test]
    fn theme_switch_reads_back_both_selections() {
        let scenario = theme_switch();

        let asserted: Vec<_> = scenario
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Assert {
                    attribute: Some(attr),
                    ..
                } => Some((attr.name.as_str(), attr.value.as_str())),
                _ => None,
            })
            .collect();

        assert_eq!(
            asserted,
            vec![
                ("data-theme", "swiss"),
                ("data-font", "editorial"),
                ("data-theme", "amber-crt"),
                ("data-font", "raw"),
            ]
        );
    }

    #[test]
    fn category_filter_checks_both_directions() {
        let scenario = category_filter();

        let hidden = scenario.steps.iter().any(|s| {
            matches!(
                s,
                Step::Assert {
                    locator,
                    visible: Some(false),
                    ..
                } if locator.has_text.as_deref() == Some("Physics")
            )
        });
        let visible = scenario.steps.iter().any(|s| {
            matches!(
                s,
                Step::Assert {
                    locator,
                    visible: Some(true),
                    ..
                } if locator.has_text.as_deref() == Some("Robotics")
            )
        });
        assert!(hidden && visible);
    }

    #[test]
    fn builtins_survive_yaml_roundtrip() {
        for scenario in all() {
            let yaml = serde_yaml::to_string(&scenario).unwrap();
            let parsed = crate::scenario::Scenario::from_yaml(&yaml).unwrap();
            assert_eq!(parsed.name, scenario.name);
            assert_eq!(parsed.steps.len(), scenario.steps.len());
        }
    }
}
