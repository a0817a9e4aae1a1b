//! Session state machine over the app's screens.
//!
//! The controller owns `(screen, selected product, language)` and nothing
//! else. The store and the catalog are passed in per event, so the controller
//! never reaches for shared state on its own.
//!
//! ```text
//!  splash ──SplashFinished──► language-selection ──Confirmed──► home
//!     │                                                          ▲
//!     └──────────SplashFinished (returning user)─────────────────┘
//!
//!  any ──ScanCodeSubmitted(hit) / ProductChosen──► product-detail
//!  product-detail ──FindAlternativesRequested──► premium-recommendations
//!  any ──Back──► home (selected product cleared)
//!  any ──NavigateTo(s)──► s   (product-detail only with a selection)
//! ```
//!
//! `Back` always lands on `home`; there is no screen stack.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::local_store::PersistentStore;
use crate::product_catalog::ProductCatalog;
use crate::product_model::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Splash,
    LanguageSelection,
    Home,
    Scanner,
    ProductDetail,
    Search,
    Favorites,
    History,
    PremiumRecommendations,
    Account,
    Settings,
    PremiumDashboard,
    FaqSupport,
    CustomLists,
    Badges,
}

impl Screen {
    pub const ALL: [Screen; 15] = [
        Screen::Splash,
        Screen::LanguageSelection,
        Screen::Home,
        Screen::Scanner,
        Screen::ProductDetail,
        Screen::Search,
        Screen::Favorites,
        Screen::History,
        Screen::PremiumRecommendations,
        Screen::Account,
        Screen::Settings,
        Screen::PremiumDashboard,
        Screen::FaqSupport,
        Screen::CustomLists,
        Screen::Badges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Splash => "splash",
            Screen::LanguageSelection => "language-selection",
            Screen::Home => "home",
            Screen::Scanner => "scanner",
            Screen::ProductDetail => "product-detail",
            Screen::Search => "search",
            Screen::Favorites => "favorites",
            Screen::History => "history",
            Screen::PremiumRecommendations => "premium-recommendations",
            Screen::Account => "account",
            Screen::Settings => "settings",
            Screen::PremiumDashboard => "premium-dashboard",
            Screen::FaqSupport => "faq-support",
            Screen::CustomLists => "custom-lists",
            Screen::Badges => "badges",
        }
    }

    /// Screens that render a single product and cannot be shown without one.
    pub fn requires_product(&self) -> bool {
        matches!(self, Screen::ProductDetail)
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .iter()
            .copied()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| AppResponse::BadRequest(format!("Unknown screen: {s}")))
    }
}

/// User intent forwarded from the presentation layer.
///
/// On the wire: `{"type": "scanCodeSubmitted", "code": "1234567890123"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NavEvent {
    SplashFinished,
    LanguageChosen { code: String },
    LanguageSelectionConfirmed,
    NavigateTo { screen: Screen },
    ScanCodeSubmitted { code: String },
    /// The simulated camera finished; stands in for a fixed scan code.
    CameraScanCompleted,
    ProductChosen { product: Product },
    Back,
    FindAlternativesRequested,
}

/// What handling an event did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NavOutcome {
    /// The screen changed to `screen`.
    Moved { screen: Screen },
    /// State was updated without a screen change.
    Stayed,
    /// Precondition not met; nothing changed.
    Ignored,
    /// No catalog entry for the scanned code. The screen is unchanged.
    ProductNotFound { code: String },
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub screen: Screen,
    pub selected_product: Option<Product>,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    screen: Screen,
    selected_product: Option<Product>,
    language: String,
    simulated_scan_code: String,
}

impl NavigationController {
    /// Starts on the splash screen with the persisted language, or the
    /// store's fallback when none was chosen.
    pub fn start(store: &PersistentStore, simulated_scan_code: &str) -> Self {
        let language = store.language().get();
        info!("Session started on splash with language {language}");
        Self {
            screen: Screen::Splash,
            selected_product: None,
            language,
            simulated_scan_code: simulated_scan_code.to_string(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.selected_product.as_ref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            screen: self.screen,
            selected_product: self.selected_product.clone(),
            language: self.language.clone(),
        }
    }

    pub fn handle(
        &mut self,
        event: NavEvent,
        store: &PersistentStore,
        catalog: &ProductCatalog,
    ) -> NavOutcome {
        debug!("Handling {event:?} on {}", self.screen);

        match event {
            NavEvent::SplashFinished => {
                let first_run =
                    !store.launch_marker().is_set() && store.language().stored().is_none();
                if first_run {
                    self.move_to(Screen::LanguageSelection)
                } else {
                    self.move_to(Screen::Home)
                }
            }
            NavEvent::LanguageChosen { code } => {
                let code = code.trim();
                if code.is_empty() {
                    return NavOutcome::Ignored;
                }
                store.language().set(code);
                self.language = code.to_string();
                NavOutcome::Stayed
            }
            NavEvent::LanguageSelectionConfirmed => {
                store.launch_marker().mark();
                self.move_to(Screen::Home)
            }
            NavEvent::NavigateTo { screen } => {
                if screen.requires_product() && self.selected_product.is_none() {
                    debug!("Refusing to open {screen} without a selected product");
                    return NavOutcome::Ignored;
                }
                self.move_to(screen)
            }
            NavEvent::ScanCodeSubmitted { code } => self.submit_scan(code.trim(), catalog),
            NavEvent::CameraScanCompleted => {
                let code = self.simulated_scan_code.clone();
                self.submit_scan(&code, catalog)
            }
            NavEvent::ProductChosen { product } => {
                self.selected_product = Some(product);
                self.move_to(Screen::ProductDetail)
            }
            NavEvent::Back => {
                self.selected_product = None;
                self.move_to(Screen::Home)
            }
            NavEvent::FindAlternativesRequested => {
                if self.selected_product.is_none() {
                    return NavOutcome::Ignored;
                }
                self.move_to(Screen::PremiumRecommendations)
            }
        }
    }

    fn submit_scan(&mut self, code: &str, catalog: &ProductCatalog) -> NavOutcome {
        match catalog.find_by_scan_code(code) {
            Some(product) => {
                self.selected_product = Some(product.clone());
                self.move_to(Screen::ProductDetail)
            }
            None => {
                info!("Scan code {code} matched no product");
                NavOutcome::ProductNotFound {
                    code: code.to_string(),
                }
            }
        }
    }

    fn move_to(&mut self, screen: Screen) -> NavOutcome {
        if self.screen != screen {
            debug!("Screen {} -> {}", self.screen, screen);
        }
        self.screen = screen;
        NavOutcome::Moved { screen }
    }
}
