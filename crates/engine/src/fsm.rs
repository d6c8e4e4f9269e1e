//! Event-driven finite state machine used by character and enemy behavior.
//!
//! Transitions are tried in registration order and the first rule whose
//! source state and event both match wins. Wildcard rules
//! ([`StateMachine::add_transition_from_any`]) take part in that same
//! ordering, so register specific rules before wildcards for the same event.
//!
//! Actions receive the caller-supplied context `C`. An owner typically keeps
//! the machine next to the data its actions touch and passes that data in:
//! `self.fsm.dispatch_event(Event::Hit, &mut self.body)`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::trace;

pub type Action<C> = Box<dyn FnMut(&mut C)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMatch<S> {
    Any,
    State(S),
}

impl<S: PartialEq> StateMatch<S> {
    fn matches(&self, current: &S) -> bool {
        match self {
            StateMatch::Any => true,
            StateMatch::State(state) => state == current,
        }
    }
}

struct Transition<S, E, C> {
    event: E,
    from: StateMatch<S>,
    to: S,
    action: Option<Action<C>>,
}

pub struct StateMachine<S, E, C> {
    state: Option<S>,
    transitions: Vec<Transition<S, E, C>>,
    on_enter: HashMap<S, Vec<Action<C>>>,
}

impl<S, E, C> Default for StateMachine<S, E, C> {
    fn default() -> Self {
        Self {
            state: None,
            transitions: Vec::new(),
            on_enter: HashMap::new(),
        }
    }
}

impl<S, E, C> StateMachine<S, E, C>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `None` until [`start`](Self::start) is called.
    pub fn state(&self) -> Option<S> {
        self.state
    }

    pub fn is_in(&self, state: S) -> bool {
        self.state == Some(state)
    }

    /// Enters `initial` and runs its on-enter actions.
    pub fn start(&mut self, initial: S, cx: &mut C) {
        trace!(state = ?initial, "fsm_start");
        self.state = Some(initial);
        self.run_on_enter(initial, cx);
    }

    pub fn add_transition(&mut self, event: E, from: S, to: S) -> &mut Self {
        self.push(event, StateMatch::State(from), to, None)
    }

    pub fn add_transition_with_action(
        &mut self,
        event: E,
        from: S,
        to: S,
        action: impl FnMut(&mut C) + 'static,
    ) -> &mut Self {
        self.push(event, StateMatch::State(from), to, Some(Box::new(action)))
    }

    pub fn add_transition_from_any(&mut self, event: E, to: S) -> &mut Self {
        self.push(event, StateMatch::Any, to, None)
    }

    pub fn add_transition_from_any_with_action(
        &mut self,
        event: E,
        to: S,
        action: impl FnMut(&mut C) + 'static,
    ) -> &mut Self {
        self.push(event, StateMatch::Any, to, Some(Box::new(action)))
    }

    pub fn add_on_enter(&mut self, state: S, action: impl FnMut(&mut C) + 'static) -> &mut Self {
        self.on_enter
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Registers `handler(cx, argument)` as an on-enter action for every
    /// `(state, argument)` pair, e.g. to pick an animation per state.
    pub fn attach_on_enter_map<A>(
        &mut self,
        handler: fn(&mut C, A),
        entries: impl IntoIterator<Item = (S, A)>,
    ) -> &mut Self
    where
        A: Clone + 'static,
        S: 'static,
        E: 'static,
        C: 'static,
    {
        for (state, argument) in entries {
            self.add_on_enter(state, move |cx: &mut C| handler(cx, argument.clone()));
        }
        self
    }

    /// Applies at most one transition. Returns whether one fired.
    pub fn dispatch_event(&mut self, event: E, cx: &mut C) -> bool {
        let Some(current) = self.state else {
            trace!(event = ?event, "fsm_event_before_start_ignored");
            return false;
        };

        let Some(index) = self
            .transitions
            .iter()
            .position(|rule| rule.event == event && rule.from.matches(&current))
        else {
            return false;
        };

        let rule = &mut self.transitions[index];
        let to = rule.to;
        trace!(from = ?current, to = ?to, event = ?event, "fsm_transition");
        self.state = Some(to);
        if let Some(action) = rule.action.as_mut() {
            action(cx);
        }
        self.run_on_enter(to, cx);
        true
    }

    fn push(
        &mut self,
        event: E,
        from: StateMatch<S>,
        to: S,
        action: Option<Action<C>>,
    ) -> &mut Self {
        self.transitions.push(Transition {
            event,
            from,
            to,
            action,
        });
        self
    }

    fn run_on_enter(&mut self, state: S, cx: &mut C) {
        if let Some(actions) = self.on_enter.get_mut(&state) {
            for action in actions.iter_mut() {
                action(cx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum State {
        A,
        B,
        C,
        Dead,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Hit,
        Next,
        Timeout,
    }

    #[derive(Debug, Default)]
    struct Log {
        entries: Vec<String>,
    }

    fn log(cx: &mut Log, entry: &'static str) {
        cx.entries.push(entry.to_string());
    }

    fn machine() -> StateMachine<State, Event, Log> {
        let mut fsm = StateMachine::new();
        fsm.add_transition(Event::Hit, State::A, State::B)
            .add_transition(Event::Next, State::B, State::C)
            .add_transition_from_any(Event::Hit, State::Dead);
        fsm
    }

    #[test]
    fn state_is_unset_until_started() {
        let mut fsm = machine();
        let mut cx = Log::default();
        assert_eq!(fsm.state(), None);
        assert!(!fsm.dispatch_event(Event::Hit, &mut cx));
        assert_eq!(fsm.state(), None);
    }

    #[test]
    fn specific_rule_registered_first_beats_wildcard() {
        let mut fsm = machine();
        let mut cx = Log::default();
        fsm.start(State::A, &mut cx);

        assert!(fsm.dispatch_event(Event::Hit, &mut cx));
        assert_eq!(fsm.state(), Some(State::B));
    }

    #[test]
    fn wildcard_catches_states_without_specific_rule() {
        let mut fsm = machine();
        let mut cx = Log::default();
        fsm.start(State::C, &mut cx);

        assert!(fsm.dispatch_event(Event::Hit, &mut cx));
        assert_eq!(fsm.state(), Some(State::Dead));
    }

    #[test]
    fn wildcard_registered_first_shadows_specific_rule() {
        let mut fsm: StateMachine<State, Event, Log> = StateMachine::new();
        fsm.add_transition_from_any(Event::Hit, State::Dead)
            .add_transition(Event::Hit, State::A, State::B);
        let mut cx = Log::default();
        fsm.start(State::A, &mut cx);

        fsm.dispatch_event(Event::Hit, &mut cx);
        assert_eq!(fsm.state(), Some(State::Dead));
    }

    #[test]
    fn start_runs_on_enter_once_and_unmatched_event_does_not_rerun_it() {
        let mut fsm = machine();
        fsm.add_on_enter(State::A, |cx: &mut Log| log(cx, "enter_a"));
        let mut cx = Log::default();

        fsm.start(State::A, &mut cx);
        assert!(!fsm.dispatch_event(Event::Timeout, &mut cx));

        assert_eq!(fsm.state(), Some(State::A));
        assert_eq!(cx.entries, vec!["enter_a"]);
    }

    #[test]
    fn transition_action_runs_before_on_enter_actions() {
        let mut fsm: StateMachine<State, Event, Log> = StateMachine::new();
        fsm.add_transition_with_action(Event::Next, State::A, State::B, |cx: &mut Log| {
            log(cx, "action")
        })
        .add_on_enter(State::B, |cx: &mut Log| log(cx, "enter_b_1"))
        .add_on_enter(State::B, |cx: &mut Log| log(cx, "enter_b_2"));
        let mut cx = Log::default();
        fsm.start(State::A, &mut cx);

        fsm.dispatch_event(Event::Next, &mut cx);
        assert_eq!(cx.entries, vec!["action", "enter_b_1", "enter_b_2"]);
    }

    #[test]
    fn only_one_transition_fires_per_event() {
        let mut fsm: StateMachine<State, Event, Log> = StateMachine::new();
        fsm.add_transition(Event::Next, State::A, State::B)
            .add_transition(Event::Next, State::B, State::C);
        let mut cx = Log::default();
        fsm.start(State::A, &mut cx);

        fsm.dispatch_event(Event::Next, &mut cx);
        assert_eq!(fsm.state(), Some(State::B));
    }

    #[test]
    fn on_enter_map_passes_per_state_argument() {
        let mut fsm = machine();
        fsm.attach_on_enter_map(
            log,
            [(State::A, "idle"), (State::B, "hurt"), (State::Dead, "dead")],
        );
        let mut cx = Log::default();

        fsm.start(State::A, &mut cx);
        fsm.dispatch_event(Event::Hit, &mut cx);
        fsm.dispatch_event(Event::Next, &mut cx);
        fsm.dispatch_event(Event::Hit, &mut cx);

        assert_eq!(cx.entries, vec!["idle", "hurt", "dead"]);
        assert!(fsm.is_in(State::Dead));
    }

    #[test]
    fn explicit_self_transition_reenters_state() {
        let mut fsm: StateMachine<State, Event, u32> = StateMachine::new();
        fsm.add_transition(Event::Timeout, State::A, State::A)
            .add_on_enter(State::A, |count: &mut u32| *count += 1);
        let mut count = 0;

        fsm.start(State::A, &mut count);
        fsm.dispatch_event(Event::Timeout, &mut count);
        assert_eq!(count, 2);
    }
}
