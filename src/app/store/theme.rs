use super::Reducer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThemeState {
    pub dark_mode: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeAction {
    Toggle,
    Set(bool),
    /// Hydrate with the already-resolved startup value.
    Initialize(bool),
}

pub struct ThemeReducer;

impl Reducer for ThemeReducer {
    type State = ThemeState;
    type Action = ThemeAction;

    fn reduce(state: Self::State, action: Self::Action) -> Self::State {
        match action {
            ThemeAction::Toggle => ThemeState {
                dark_mode: !state.dark_mode,
            },
            ThemeAction::Set(dark_mode) | ThemeAction::Initialize(dark_mode) => {
                ThemeState { dark_mode }
            }
        }
    }
}
