// services/dispatch-dash/src/nav.rs
//
// Navigation entries and page titles

pub const APP_TITLE: &str = "DeliverEase";

#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub name: &'static str,
    pub path: &'static str,
    pub notifications: u32,
}

impl NavItem {
    /// Badge text, shown only when something is unread.
    pub fn badge(&self) -> Option<String> {
        (self.notifications > 0).then(|| self.notifications.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NavSection {
    pub name: &'static str,
    pub path: Option<&'static str>,
    pub subitems: &'static [NavItem],
}

pub const NAV_ITEMS: [NavItem; 6] = [
    NavItem { name: "Dashboard", path: "/", notifications: 0 },
    NavItem { name: "Prediction", path: "/prediction", notifications: 0 },
    NavItem { name: "History", path: "/history", notifications: 0 },
    NavItem { name: "Chat", path: "/chat", notifications: 4 },
    NavItem { name: "Route", path: "/route", notifications: 0 },
    NavItem { name: "Pending Orders", path: "/pending-orders", notifications: 7 },
];

pub const SECONDARY_NAV: [NavSection; 2] = [
    NavSection {
        name: "Settings",
        path: None,
        subitems: &[
            NavItem { name: "Profile", path: "/settings/profile", notifications: 0 },
            NavItem { name: "Preferences", path: "/settings/preferences", notifications: 0 },
            NavItem { name: "Notifications", path: "/settings/notifications", notifications: 0 },
        ],
    },
    NavSection {
        name: "Help",
        path: Some("/help"),
        subitems: &[],
    },
];

/// Primary entries that currently carry a badge, in menu order.
pub fn badged_items() -> impl Iterator<Item = &'static NavItem> {
    let items: &'static [NavItem] = &NAV_ITEMS;
    items.iter().filter(|item| item.notifications > 0)
}

/// Title shown in the header for `path`; unknown paths get the app name.
pub fn page_title(path: &str) -> String {
    if let Some(item) = NAV_ITEMS.iter().find(|item| item.path == path) {
        return item.name.to_string();
    }

    for section in &SECONDARY_NAV {
        if section.path == Some(path) {
            return section.name.to_string();
        }
        if let Some(sub) = section.subitems.iter().find(|sub| sub.path == path) {
            return format!("{} - {}", section.name, sub.name);
        }
    }

    APP_TITLE.to_string()
}

/// Screens the terminal front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Route,
}

impl Screen {
    pub const ALL: [Screen; 2] = [Screen::Dashboard, Screen::Route];

    pub fn path(self) -> &'static str {
        match self {
            Screen::Dashboard => "/",
            Screen::Route => "/route",
        }
    }

    pub fn title(self) -> String {
        page_title(self.path())
    }

    pub fn next(self) -> Self {
        match self {
            Screen::Dashboard => Screen::Route,
            Screen::Route => Screen::Dashboard,
        }
    }
}
