//! The listing view: post cards, tag buttons, and the synchronizer that
//! projects [`FilterState`] plus engine output onto them. The browser owns
//! the real elements; this module is the same logic over an element model,
//! so the show/hide, indicator, and binding behavior is testable and
//! reusable from the CLI. Everything is single-threaded and synchronous:
//! each input event runs one complete state-update/search/render pass
//! before the next is handled.

use crate::filter::{FilterState, ALL_TAG};
use crate::search::{self, Document};
use std::collections::{HashMap, HashSet};

/// Placeholder installed on pages where the search box navigates instead of
/// filtering inline.
const REDIRECT_PLACEHOLDER: &str = "Search… ↵";

/// One post card, bound 1:1 to a [`Document`] by shared id. The tag set is
/// parsed once at construction and cached, not re-parsed per filter pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    id: String,
    tags: Vec<String>,
    hidden: bool,
}

impl Card {
    pub fn new(id: impl Into<String>, tags: Vec<String>) -> Card {
        Card {
            id: id.into(),
            tags,
            hidden: false,
        }
    }

    /// Builds a card from its rendered attributes: the post id and the
    /// JSON-encoded tag array. Malformed tag metadata degrades to an empty
    /// tag list for this card alone; filtering proceeds for other cards
    /// unaffected.
    pub fn from_attrs(id: &str, tags_json: &str) -> Card {
        let tags = match serde_json::from_str::<serde_json::Value>(tags_json) {
            Ok(value) => match value.as_array() {
                Some(items) => items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_owned)
                    .collect(),
                None => Vec::new(),
            },
            Err(_) => Vec::new(),
        };
        Card::new(id, tags)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    // The tag filter passes when nothing is selected or when the card's
    // cached tag set intersects the selection.
    fn passes_tag(&self, state: &FilterState) -> bool {
        state.unfiltered() || self.tags.iter().any(|tag| state.is_selected(tag))
    }
}

/// One tag filter button: its tag key, its optional display label, and
/// whether it currently renders as pressed.
#[derive(Clone, Debug)]
pub struct TagButton {
    key: String,
    label: Option<String>,
    pressed: bool,
}

impl TagButton {
    pub fn new(key: impl Into<String>, label: Option<&str>) -> TagButton {
        TagButton {
            key: key.into(),
            label: label.map(str::to_owned),
            pressed: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// The card collection plus the indicator elements around it.
pub struct Listing {
    cards: Vec<Card>,
    buttons: Vec<TagButton>,
    labels: HashMap<String, String>,
    indicator: Option<String>,
    empty_visible: bool,
}

impl Listing {
    /// Builds the listing and its label lookup. A button without a display
    /// label falls back to its raw key; the reserved [`ALL_TAG`] is always
    /// labeled `All`.
    pub fn new(cards: Vec<Card>, buttons: Vec<TagButton>) -> Listing {
        let mut labels: HashMap<String, String> = buttons
            .iter()
            .filter(|button| !button.key.is_empty())
            .map(|button| {
                (
                    button.key.clone(),
                    button.label.clone().unwrap_or_else(|| button.key.clone()),
                )
            })
            .collect();
        labels.insert(ALL_TAG.to_owned(), "All".to_owned());
        Listing {
            cards,
            buttons,
            labels,
            indicator: None,
            empty_visible: false,
        }
    }

    /// Projects the current state onto the view: a card is shown iff
    /// (the search result is "no filter" or the card's id is in the result
    /// set) and the card passes the tag filter. Also refreshes the
    /// empty-results indicator, the active-filter indicator text, and every
    /// button's pressed state. Idempotent: rendering the same state twice
    /// produces identical visibility everywhere.
    pub fn render(&mut self, matches: Option<&HashSet<String>>, state: &FilterState) {
        let mut visible = 0;
        for card in &mut self.cards {
            let shown =
                matches.map_or(true, |ids| ids.contains(&card.id)) && card.passes_tag(state);
            card.hidden = !shown;
            if shown {
                visible += 1;
            }
        }
        self.empty_visible = visible == 0;
        self.indicator = indicator_text(&self.labels, state);
        for button in &mut self.buttons {
            button.pressed = match button.key.as_str() {
                ALL_TAG => state.unfiltered(),
                key => state.is_selected(key),
            };
        }
    }

    pub fn visible_count(&self) -> usize {
        self.cards.iter().filter(|card| !card.hidden).count()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn buttons(&self) -> &[TagButton] {
        &self.buttons
    }

    /// The active-filter indicator text, or `None` when the indicator
    /// element stays hidden.
    pub fn indicator(&self) -> Option<&str> {
        self.indicator.as_deref()
    }

    pub fn empty_state_visible(&self) -> bool {
        self.empty_visible
    }
}

fn indicator_text(labels: &HashMap<String, String>, state: &FilterState) -> Option<String> {
    if state.unfiltered() {
        return None;
    }
    let tags: Vec<String> = state
        .selected()
        .map(|tag| match labels.get(tag) {
            Some(label) => format!("#{}", label),
            None => format!("#{}", tag),
        })
        .collect();
    let prefix = match state.selected_count() {
        1 => "Filtering by tag:",
        _ => "Filtering by tags:",
    };
    Some(format!("{} {}", prefix, tags.join(", ")))
}

/// The search input element. The bound flag guards against duplicate event
/// wiring when initialization runs again after a client-side page
/// transition.
#[derive(Clone, Debug, Default)]
pub struct SearchInput {
    pub value: String,
    pub placeholder: String,
    bound: bool,
}

impl SearchInput {
    pub fn new() -> SearchInput {
        SearchInput::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }
}

/// How the search input got wired on this page.
pub enum Binding {
    /// A listing page with cards and a payload: inline filtering.
    Filter(Controller),

    /// No cards on this page; Enter navigates to the listing instead.
    Redirect(Redirect),

    /// Cards but no payload: the input is claimed but does nothing.
    Inert,
}

/// Wires the search control. Returns `None` without touching anything when
/// the input is already bound, so repeat initialization is a no-op. Cards,
/// buttons, and payload are taken fresh on every call -- a new page's
/// elements never see a previous page's state. `initial_query` carries a
/// consumed `?q=` parameter from a redirect-mode navigation.
pub fn bind(
    input: &mut SearchInput,
    cards: Vec<Card>,
    buttons: Vec<TagButton>,
    payload: Vec<Document>,
    initial_query: Option<&str>,
) -> Option<Binding> {
    if input.bound {
        return None;
    }
    input.bound = true;

    if cards.is_empty() {
        input.placeholder = REDIRECT_PLACEHOLDER.to_owned();
        return Some(Binding::Redirect(Redirect));
    }
    if payload.is_empty() {
        return Some(Binding::Inert);
    }

    if let Some(query) = initial_query {
        input.value = query.to_owned();
    }
    let mut controller = Controller {
        payload,
        state: FilterState::new(),
        listing: Listing::new(cards, buttons),
    };
    let initial = input.value.clone();
    controller.input(&initial);
    Some(Binding::Filter(controller))
}

/// Drives the inline variant: holds the loaded payload, the filter state,
/// and the listing, and re-evaluates the whole pipeline on every event.
pub struct Controller {
    payload: Vec<Document>,
    state: FilterState,
    listing: Listing,
}

impl Controller {
    /// One keystroke: store the query and re-evaluate.
    pub fn input(&mut self, text: &str) {
        self.state.set_query(text);
        self.refresh();
    }

    /// One tag button click: toggle the key and re-evaluate.
    pub fn click_tag(&mut self, key: &str) {
        self.state.toggle(key);
        self.refresh();
    }

    fn refresh(&mut self) {
        let matches = search::search(&self.payload, self.state.query());
        self.listing.render(matches.as_ref(), &self.state);
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }
}

/// The redirect variant, used on pages without post cards.
pub struct Redirect;

impl Redirect {
    /// Builds the navigation target for Enter: `/?q={query}`, or `/` when
    /// the trimmed query is blank.
    pub fn submit(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            String::from("/")
        } else {
            let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
            format!("/?q={}", encoded)
        }
    }
}

/// A collapsible tag sidebar: one toggle/container pair. Starts collapsed;
/// the bound flag keeps repeat initialization from wiring the toggle twice.
#[derive(Clone, Debug, Default)]
pub struct TagMenu {
    open: bool,
    bound: bool,
}

impl TagMenu {
    pub fn new() -> TagMenu {
        TagMenu::default()
    }

    /// Claims the menu and collapses it. Returns `false` when the menu was
    /// already bound, in which case nothing changes.
    pub fn bind(&mut self) -> bool {
        if self.bound {
            return false;
        }
        self.open = false;
        self.bound = true;
        true
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Mirrors the toggle's `aria-expanded` state.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn document(id: &str, title: &str, tags: &[&str]) -> Document {
        Document {
            id: id.to_owned(),
            title: title.to_owned(),
            description: String::new(),
            body: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn payload() -> Vec<Document> {
        vec![
            document("a", "Rust Basics", &["rust", "systems"]),
            document("b", "Go Routines", &["go", "concurrency"]),
        ]
    }

    fn cards() -> Vec<Card> {
        vec![
            Card::new("a", vec!["rust".to_owned(), "systems".to_owned()]),
            Card::new("b", vec!["go".to_owned(), "concurrency".to_owned()]),
        ]
    }

    fn buttons() -> Vec<TagButton> {
        vec![
            TagButton::new(ALL_TAG, Some("All")),
            TagButton::new("rust", Some("Rust")),
            TagButton::new("go", None),
        ]
    }

    fn bind_full(input: &mut SearchInput, initial_query: Option<&str>) -> Controller {
        match bind(input, cards(), buttons(), payload(), initial_query) {
            Some(Binding::Filter(controller)) => controller,
            _ => panic!("wanted the inline filter binding"),
        }
    }

    fn hidden(listing: &Listing) -> Vec<(String, bool)> {
        listing
            .cards()
            .iter()
            .map(|card| (card.id().to_owned(), card.is_hidden()))
            .collect()
    }

    #[test]
    fn test_initial_render_shows_everything() {
        let mut input = SearchInput::new();
        let controller = bind_full(&mut input, None);
        assert_eq!(2, controller.listing().visible_count());
        assert_eq!(None, controller.listing().indicator());
        assert!(!controller.listing().empty_state_visible());
    }

    #[test]
    fn test_query_narrows_cards() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.input("rust");
        assert_eq!(
            vec![("a".to_owned(), false), ("b".to_owned(), true)],
            hidden(controller.listing())
        );
    }

    #[test]
    fn test_tag_click_narrows_cards() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("go");
        assert_eq!(
            vec![("a".to_owned(), true), ("b".to_owned(), false)],
            hidden(controller.listing())
        );
        assert_eq!(
            Some("Filtering by tag: #go"),
            controller.listing().indicator()
        );
    }

    #[test]
    fn test_indicator_uses_registered_label() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("rust");
        assert_eq!(
            Some("Filtering by tag: #Rust"),
            controller.listing().indicator()
        );
    }

    #[test]
    fn test_indicator_pluralizes() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("go");
        controller.click_tag("rust");
        assert_eq!(
            Some("Filtering by tags: #go, #Rust"),
            controller.listing().indicator()
        );
    }

    #[test]
    fn test_indicator_falls_back_to_raw_key() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("concurrency");
        assert_eq!(
            Some("Filtering by tag: #concurrency"),
            controller.listing().indicator()
        );
    }

    #[test]
    fn test_pressed_states_mirror_selection() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);

        let pressed = |listing: &Listing, key: &str| {
            listing
                .buttons()
                .iter()
                .find(|button| button.key() == key)
                .map(TagButton::is_pressed)
                .unwrap()
        };

        assert!(pressed(controller.listing(), ALL_TAG));
        controller.click_tag("rust");
        assert!(pressed(controller.listing(), "rust"));
        assert!(!pressed(controller.listing(), ALL_TAG));
        controller.click_tag(ALL_TAG);
        assert!(pressed(controller.listing(), ALL_TAG));
        assert!(!pressed(controller.listing(), "rust"));
    }

    #[test]
    fn test_query_and_tags_combine() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("go");
        controller.input("routines");
        assert_eq!(1, controller.listing().visible_count());

        // A query matching only the other tag's card: nothing passes both.
        controller.input("rust");
        assert_eq!(0, controller.listing().visible_count());
        assert!(controller.listing().empty_state_visible());
    }

    #[test]
    fn test_empty_state_clears_when_filters_relax() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.input("no such post");
        assert!(controller.listing().empty_state_visible());
        controller.input("");
        assert!(!controller.listing().empty_state_visible());
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut input = SearchInput::new();
        let mut controller = bind_full(&mut input, None);
        controller.click_tag("go");
        controller.input("routines");
        let first = hidden(controller.listing());
        let indicator = controller.listing().indicator().map(str::to_owned);
        // Re-deliver the same input; every flag must come out the same.
        controller.input("routines");
        assert_eq!(first, hidden(controller.listing()));
        assert_eq!(
            indicator.as_deref(),
            controller.listing().indicator()
        );
    }

    #[test]
    fn test_initial_query_is_applied() {
        let mut input = SearchInput::new();
        let controller = bind_full(&mut input, Some("rust"));
        assert_eq!("rust", input.value);
        assert_eq!(1, controller.listing().visible_count());
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut input = SearchInput::new();
        let _ = bind_full(&mut input, None);
        assert!(input.is_bound());
        assert!(bind(&mut input, cards(), buttons(), payload(), None).is_none());
    }

    #[test]
    fn test_no_cards_binds_redirect() {
        let mut input = SearchInput::new();
        let redirect = match bind(&mut input, Vec::new(), Vec::new(), payload(), None) {
            Some(Binding::Redirect(redirect)) => redirect,
            _ => panic!("wanted the redirect binding"),
        };
        assert_eq!("Search… ↵", input.placeholder);
        assert_eq!("/?q=rust", redirect.submit("rust"));
        assert_eq!("/?q=hello+world", redirect.submit(" hello world "));
        assert_eq!("/", redirect.submit("   "));
    }

    #[test]
    fn test_empty_payload_binds_inert() {
        let mut input = SearchInput::new();
        match bind(&mut input, cards(), buttons(), Vec::new(), None) {
            Some(Binding::Inert) => {}
            _ => panic!("wanted the inert binding"),
        }
        assert!(input.is_bound());
    }

    #[test]
    fn test_malformed_card_tags_degrade_to_empty() {
        let card = Card::from_attrs("c", "{oops");
        let mut listing = Listing::new(
            vec![card, Card::new("b", vec!["go".to_owned()])],
            buttons(),
        );

        // No tag filter: the malformed card is visible like any other.
        let state = FilterState::new();
        listing.render(None, &state);
        assert_eq!(2, listing.visible_count());

        // Any tag filter hides a card with zero tags.
        let mut state = FilterState::new();
        state.toggle("go");
        listing.render(None, &state);
        assert_eq!(
            vec![("c".to_owned(), true), ("b".to_owned(), false)],
            listing
                .cards()
                .iter()
                .map(|card| (card.id().to_owned(), card.is_hidden()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_card_from_attrs_parses_tags_once() {
        let card = Card::from_attrs("a", r#"["rust", "systems"]"#);
        assert_eq!(
            Card::new("a", vec!["rust".to_owned(), "systems".to_owned()]),
            card
        );
        // Non-array JSON degrades like malformed JSON does.
        assert!(Card::from_attrs("a", r#""rust""#) == Card::new("a", Vec::new()));
    }

    #[test]
    fn test_tag_menu_toggle_and_rebind() {
        let mut menu = TagMenu::new();
        assert!(menu.bind());
        assert!(!menu.is_open());
        menu.toggle();
        assert!(menu.is_open());
        // Rebinding is refused and leaves the open state alone.
        assert!(!menu.bind());
        assert!(menu.is_open());
        menu.toggle();
        assert!(!menu.is_open());
    }
}
