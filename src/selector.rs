//! Single-value dropdown with incremental filtering.
//!
//! The selector is a controlled component: it never stores the selected value.
//! Choosing an option hands the value back to the caller, who writes it into
//! whatever state the dropdown is bound to.

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption<V> {
    pub label: String,
    pub value: V,
}

impl<V> SelectOption<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl SelectOption<String> {
    /// Option whose label and value are the same text.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Options whose label contains `term`, case-insensitively, in original order.
pub fn filter_options<'a, V>(options: &'a [SelectOption<V>], term: &str) -> Vec<&'a SelectOption<V>> {
    let needle = term.to_lowercase();
    options
        .iter()
        .filter(|option| option.label.to_lowercase().contains(&needle))
        .collect()
}

/// What the dropdown overlay should render.
#[derive(Debug, PartialEq)]
pub enum Listing<'a, V> {
    Closed,
    /// open, but nothing matches the filter
    Empty,
    Options(Vec<&'a SelectOption<V>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorInput {
    Toggle,
    Filter(String),
    /// pick the n-th entry of the currently visible (filtered) list
    Choose(usize),
    /// a pointer press anywhere on the page
    PointerDown { inside: bool },
    Close,
}

#[derive(Debug, Clone)]
pub struct FilterableSelector<V> {
    options: Vec<SelectOption<V>>,
    searchable: bool,
    open: bool,
    filter: String,
}

impl<V: Clone + PartialEq> FilterableSelector<V> {
    pub fn new(options: Vec<SelectOption<V>>, searchable: bool) -> Self {
        Self {
            options,
            searchable,
            open: false,
            filter: String::new(),
        }
    }

    pub fn options(&self) -> &[SelectOption<V>] {
        &self.options
    }

    /// Replace the option list (e.g. after a catalog reload); open state is kept.
    pub fn set_options(&mut self, options: Vec<SelectOption<V>>) {
        self.options = options;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close and forget the filter term.
    pub fn close(&mut self) {
        self.open = false;
        self.filter.clear();
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn set_filter(&mut self, term: impl Into<String>) {
        if self.open && self.searchable {
            self.filter = term.into();
        }
    }

    pub fn visible(&self) -> Listing<'_, V> {
        if !self.open {
            return Listing::Closed;
        }
        let matches = filter_options(&self.options, &self.filter);
        if matches.is_empty() {
            Listing::Empty
        } else {
            Listing::Options(matches)
        }
    }

    /// Pick an entry of the visible list. Returns the value for the caller to
    /// apply; the dropdown closes either way if the index was valid.
    pub fn choose(&mut self, index: usize) -> Option<V> {
        let value = match self.visible() {
            Listing::Options(matches) => matches.get(index).map(|option| option.value.clone()),
            _ => None,
        }?;
        self.close();
        Some(value)
    }

    /// Presses outside the control dismiss it without selecting.
    pub fn pointer_down(&mut self, inside: bool) {
        if self.open && !inside {
            self.close();
        }
    }

    pub fn handle(&mut self, input: SelectorInput) -> Option<V> {
        match input {
            SelectorInput::Toggle => self.toggle(),
            SelectorInput::Filter(term) => self.set_filter(term),
            SelectorInput::Choose(index) => return self.choose(index),
            SelectorInput::PointerDown { inside } => self.pointer_down(inside),
            SelectorInput::Close => self.close(),
        }
        None
    }

    /// Label to show in the closed control for the bound value.
    pub fn label_for(&self, value: &V) -> Option<&str> {
        self.options
            .iter()
            .find(|option| &option.value == value)
            .map(|option| option.label.as_str())
    }
}
