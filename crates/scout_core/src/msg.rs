use crate::Item;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A pass begins on the currently loaded page.
    PassStarted,
    /// The card locator finished (after scroll stabilization).
    CardsLocated { count: usize },
    /// Field extraction over the located cards finished.
    ItemsExtracted {
        items: Vec<Item>,
        /// Item-id of the first card on the page.
        signature: Option<String>,
    },
    /// The page's items were merged into the store.
    PagePersisted { accumulated: Vec<Item>, added: usize },
    /// The next-page cascade finished.
    NextControlResolved { found: bool },
    /// Every activation method was tried; `ok` if one triggered navigation.
    NextControlActivated { ok: bool },
}
