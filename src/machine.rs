//! This module defines the `TuringMachine` struct, which executes a compiled `Automaton`
//! against an unbounded tape. Execution is driven by the caller one step at a time, either
//! through [`TuringMachine::step`] or by iterating the machine; [`TuringMachine::run`] adds a
//! step budget on top of that.

use crate::types::{
    is_terminal, Automaton, Configuration, Halt, Outcome, RunResult, RuntimeFault, State, Step,
    Symbol, TmlError, Transition, ACCEPT, REJECT,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A single execution of a compiled machine.
///
/// The automaton is shared and never modified, so any number of machines may run the same
/// program. The tape stores non-blank cells only; every other position reads as blank.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    automaton: Arc<Automaton>,
    input: Vec<Symbol>,
    state: String,
    head: i64,
    tape: BTreeMap<i64, Symbol>,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a machine for `automaton` with `input` written from position 0.
    ///
    /// Each character of `input` is one tape symbol; `_` stands for blank.
    ///
    /// # Returns
    ///
    /// * `Err(TmlError::InvalidInput)` if a character is not part of the alphabet.
    pub fn new(automaton: impl Into<Arc<Automaton>>, input: &str) -> Result<Self, TmlError> {
        let symbols = input.chars().map(Symbol::from_input).collect();
        Self::with_symbols(automaton, symbols)
    }

    /// Creates a machine from already decoded input symbols.
    pub fn with_symbols(
        automaton: impl Into<Arc<Automaton>>,
        input: Vec<Symbol>,
    ) -> Result<Self, TmlError> {
        let automaton = automaton.into();
        check_input(&automaton, &input)?;

        let mut machine = Self {
            state: automaton.initial_state.clone(),
            automaton,
            input,
            head: 0,
            tape: BTreeMap::new(),
            step_count: 0,
        };
        machine.reset();

        Ok(machine)
    }

    /// Executes a single transition.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` with the configuration reached by the transition.
    /// * `Step::Halt(Halt::Accept | Halt::Reject)` if the machine already sits on a terminal
    ///   label. Terminal labels are absorbing: the machine is left unchanged.
    /// * `Step::Halt(Halt::Err(_))` if no transition applies. The machine is left unchanged.
    pub fn step(&mut self) -> Step {
        match self.state.as_str() {
            ACCEPT => return Step::Halt(Halt::Accept),
            REJECT => return Step::Halt(Halt::Reject),
            _ => {}
        }

        let transition = match self.transition() {
            Ok(transition) => transition.clone(),
            Err(fault) => return Step::Halt(Halt::Err(fault)),
        };

        if let Some(symbol) = transition.write {
            self.write(symbol);
        }
        if let Some(direction) = transition.movement {
            self.head += direction.offset();
        }
        self.state = transition.next;
        self.step_count += 1;

        trace!(state = %self.state, head = self.head, step = self.step_count, "step");

        Step::Continue(self.configuration())
    }

    /// Runs the machine until it halts or `max_steps` more transitions have been made.
    ///
    /// A run that times out can be continued by calling `run` again.
    pub fn run(&mut self, max_steps: usize) -> RunResult {
        let mut outcome = None;
        for _ in 0..max_steps {
            if let Step::Halt(halt) = self.step() {
                outcome = Some(halt.into());
                break;
            }
        }

        let outcome = outcome.unwrap_or_else(|| match self.state.as_str() {
            ACCEPT => Outcome::Accept,
            REJECT => Outcome::Reject,
            _ => Outcome::Timeout,
        });
        debug!(?outcome, steps = self.step_count, "run finished");

        RunResult {
            outcome,
            final_tape_window: self.tape_window(),
            step_count: self.step_count,
        }
    }

    /// Returns the transition that the next step would take.
    pub fn transition(&self) -> Result<&Transition, RuntimeFault> {
        match self.automaton.state(&self.state) {
            Some(State::Constant(transition)) => Ok(transition),
            Some(State::Variable { transitions }) => {
                let symbol = self.symbol();
                transitions
                    .get(&symbol)
                    .ok_or_else(|| RuntimeFault::UndefinedTransition {
                        state: self.state.clone(),
                        symbol,
                    })
            }
            None => Err(RuntimeFault::InvalidState(self.state.clone())),
        }
    }

    /// Restores the initial label, head position and tape. The step count is reset too.
    pub fn reset(&mut self) {
        self.state = self.automaton.initial_state.clone();
        self.head = 0;
        self.step_count = 0;
        self.tape = self
            .input
            .iter()
            .enumerate()
            .filter(|(_, symbol)| **symbol != Symbol::Blank)
            .map(|(position, symbol)| (position as i64, *symbol))
            .collect();
    }

    /// Replaces the input tape and resets the machine.
    pub fn load_input(&mut self, input: &str) -> Result<(), TmlError> {
        let symbols: Vec<Symbol> = input.chars().map(Symbol::from_input).collect();
        check_input(&self.automaton, &symbols)?;

        self.input = symbols;
        self.reset();
        Ok(())
    }

    /// Returns the current label.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn initial_state(&self) -> &str {
        &self.automaton.initial_state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// The symbol currently under the head.
    pub fn symbol(&self) -> Symbol {
        self.tape.get(&self.head).copied().unwrap_or(Symbol::Blank)
    }

    /// Returns the total number of transitions made since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Whether the machine sits on `accept` or `reject`.
    pub fn is_halted(&self) -> bool {
        is_terminal(&self.state)
    }

    pub fn configuration(&self) -> Configuration {
        Configuration {
            label: self.state.clone(),
            head: self.head,
            symbol: self.symbol(),
        }
    }

    /// The non-blank cells of the tape, by position.
    pub fn tape(&self) -> &BTreeMap<i64, Symbol> {
        &self.tape
    }

    /// Renders the tape from its leftmost to its rightmost non-blank cell, using `_` for
    /// blank cells in between. An all-blank tape renders as an empty string.
    pub fn tape_window(&self) -> String {
        let (Some((&first, _)), Some((&last, _))) =
            (self.tape.first_key_value(), self.tape.last_key_value())
        else {
            return String::new();
        };

        (first..=last)
            .map(|position| {
                self.tape
                    .get(&position)
                    .copied()
                    .unwrap_or(Symbol::Blank)
                    .as_char()
            })
            .collect()
    }

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    fn write(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::Blank => self.tape.remove(&self.head),
            letter => self.tape.insert(self.head, letter),
        };
    }
}

/// Yields the configuration reached by each transition. Iteration ends when the machine
/// halts or faults; call [`TuringMachine::reset`] to start over.
impl Iterator for TuringMachine {
    type Item = Configuration;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Step::Continue(configuration) => Some(configuration),
            Step::Halt(_) => None,
        }
    }
}

impl From<Halt> for Outcome {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Accept => Outcome::Accept,
            Halt::Reject => Outcome::Reject,
            Halt::Err(fault) => Outcome::Fault(fault),
        }
    }
}

/// Runs `automaton` on `input` with a budget of `max_steps` transitions.
pub fn run(
    automaton: impl Into<Arc<Automaton>>,
    input: &str,
    max_steps: usize,
) -> Result<RunResult, TmlError> {
    Ok(TuringMachine::new(automaton, input)?.run(max_steps))
}

fn check_input(automaton: &Automaton, input: &[Symbol]) -> Result<(), TmlError> {
    match input.iter().find(|symbol| !automaton.accepts_symbol(**symbol)) {
        Some(symbol) => Err(TmlError::InvalidInput(symbol.as_char())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_source;
    use crate::types::{Direction, MAX_EXECUTION_STEPS};

    const IS_DIV2: &str = r#"
alphabet = {0, 1}
module isDiv2 {
    while 0, 1 {
        move right
    } if blank {
        move left
        if 0 {
            accept
        } if 1, blank {
            reject
        }
    }
}"#;

    const INCREMENT: &str = r#"
alphabet = {0, 1}
module increment {
    while 0, 1 {
        move right
    } if blank {
        move left
        goto carry
    }
}
module carry {
    while 1 {
        changeto 0
        move left
    } if 0, blank {
        changeto 1
        accept
    }
}"#;

    fn machine(source: &str, input: &str) -> TuringMachine {
        TuringMachine::new(compile_source(source).unwrap(), input).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = machine(IS_DIV2, "10");

        assert_eq!(machine.state(), "isDiv20");
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.symbol(), Symbol::Letter('1'));
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.tape_window(), "10");
    }

    #[test]
    fn test_is_div2_outcomes() {
        let automaton = Arc::new(compile_source(IS_DIV2).unwrap());

        let even = run(automaton.clone(), "10", MAX_EXECUTION_STEPS).unwrap();
        assert_eq!(even.outcome, Outcome::Accept);
        assert_eq!(even.step_count, 4);
        assert_eq!(even.final_tape_window, "10");

        let odd = run(automaton.clone(), "101", MAX_EXECUTION_STEPS).unwrap();
        assert_eq!(odd.outcome, Outcome::Reject);

        assert_eq!(
            run(automaton.clone(), "1100", MAX_EXECUTION_STEPS).unwrap().outcome,
            Outcome::Accept
        );
    }

    #[test]
    fn test_is_div2_on_blank_tape() {
        // The head moves left from a blank onto another blank, which the last case rejects.
        let result = run(compile_source(IS_DIV2).unwrap(), "", MAX_EXECUTION_STEPS).unwrap();

        assert_eq!(result.outcome, Outcome::Reject);
        assert_eq!(result.step_count, 2);
        assert_eq!(result.final_tape_window, "");
    }

    #[test]
    fn test_single_step() {
        let mut machine = machine(IS_DIV2, "10");

        let step = machine.step();
        assert_eq!(
            step,
            Step::Continue(Configuration {
                label: "isDiv20".into(),
                head: 1,
                symbol: Symbol::Letter('0'),
            })
        );
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_terminal_labels_are_absorbing() {
        let mut machine = machine(IS_DIV2, "0");
        let result = machine.run(MAX_EXECUTION_STEPS);
        assert_eq!(result.outcome, Outcome::Accept);

        let steps = machine.step_count();
        assert_eq!(machine.step(), Step::Halt(Halt::Accept));
        assert_eq!(machine.step(), Step::Halt(Halt::Accept));
        assert_eq!(machine.step_count(), steps);
        assert!(machine.is_halted());
    }

    #[test]
    fn test_writes_and_negative_positions() {
        let result = run(compile_source(INCREMENT).unwrap(), "1011", MAX_EXECUTION_STEPS).unwrap();
        assert_eq!(result.outcome, Outcome::Accept);
        assert_eq!(result.final_tape_window, "1100");

        let mut machine = machine(INCREMENT, "111");
        assert_eq!(machine.run(MAX_EXECUTION_STEPS).outcome, Outcome::Accept);
        assert_eq!(machine.tape_window(), "1000");
        assert_eq!(machine.head(), -1);
        assert_eq!(machine.tape().keys().next(), Some(&-1));
    }

    #[test]
    fn test_writing_blank_erases() {
        let source = "alphabet = {a}\nmodule main {\n    changeto blank move right\n    accept\n}";
        let mut machine = machine(source, "aa");
        machine.run(MAX_EXECUTION_STEPS);

        assert_eq!(machine.tape_window(), "a");
        assert_eq!(machine.tape().keys().collect::<Vec<_>>(), vec![&1]);
    }

    #[test]
    fn test_missing_transition_faults() {
        let source = "alphabet = {a, b}\nmodule main {\n    if a { accept }\n}";
        let mut machine = machine(source, "b");

        let step = machine.step();
        assert_eq!(
            step,
            Step::Halt(Halt::Err(RuntimeFault::UndefinedTransition {
                state: "main0".into(),
                symbol: Symbol::Letter('b'),
            }))
        );
        // A fault leaves the machine where it was.
        assert_eq!(machine.state(), "main0");
        assert_eq!(machine.step_count(), 0);

        let result = machine.run(10);
        assert!(matches!(result.outcome, Outcome::Fault(_)));
        assert_ne!(result.outcome, Outcome::Reject);
    }

    #[test]
    fn test_undefined_state_faults() {
        let mut automaton = compile_source("alphabet = {a}\nmodule main { move right }").unwrap();
        automaton.states.insert(
            "main0".into(),
            State::Constant(Transition::to("missing")),
        );

        let mut machine = TuringMachine::new(automaton, "").unwrap();
        assert!(matches!(machine.step(), Step::Continue(_)));
        assert_eq!(
            machine.step(),
            Step::Halt(Halt::Err(RuntimeFault::InvalidState("missing".into())))
        );
    }

    #[test]
    fn test_timeout_and_resume() {
        let source = r#"alphabet = {a}
module main {
    move right
    move right
    move right
    accept
}"#;
        let mut machine = machine(source, "");
        // The third move and `accept` share a block.
        assert_eq!(machine.automaton().states.len(), 3);

        let first = machine.run(2);
        assert_eq!(first.outcome, Outcome::Timeout);
        assert_eq!(first.step_count, 2);
        assert_eq!(machine.state(), "main2");

        let second = machine.run(5);
        assert_eq!(second.outcome, Outcome::Accept);
        assert_eq!(second.step_count, 3);
        assert_eq!(machine.head(), 3);
    }

    #[test]
    fn test_run_reaching_accept_on_last_step() {
        let source = "alphabet = {a}\nmodule main {\n    move right\n    accept\n}";
        let result = machine(source, "").run(2);
        assert_eq!(result.outcome, Outcome::Accept);
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let source = "alphabet = {a}\nmodule spin {\n    while a, blank { move right }\n}";
        let result = machine(source, "aaa").run(100);

        assert_eq!(result.outcome, Outcome::Timeout);
        assert_eq!(result.step_count, 100);
    }

    #[test]
    fn test_iterator_and_reset() {
        let mut machine = machine(IS_DIV2, "10");

        let trace: Vec<Configuration> = machine.by_ref().collect();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.last().unwrap().label, ACCEPT);
        assert_eq!(
            trace.iter().map(|c| c.head).collect::<Vec<_>>(),
            vec![1, 2, 1, 1]
        );
        assert!(machine.next().is_none());

        machine.reset();
        assert_eq!(machine.state(), "isDiv20");
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.count(), 4);
    }

    #[test]
    fn test_load_input() {
        let mut machine = machine(IS_DIV2, "10");
        machine.run(MAX_EXECUTION_STEPS);

        machine.load_input("1_1").unwrap();
        assert_eq!(machine.state(), "isDiv20");
        assert_eq!(machine.tape_window(), "1_1");
        assert_eq!(machine.tape().len(), 2);

        assert!(matches!(
            machine.load_input("12"),
            Err(TmlError::InvalidInput('2'))
        ));
        // A rejected input leaves the previous tape in place.
        assert_eq!(machine.tape_window(), "1_1");
    }

    #[test]
    fn test_invalid_input() {
        let automaton = compile_source(IS_DIV2).unwrap();
        let result = TuringMachine::new(automaton, "10a");
        assert!(matches!(result, Err(TmlError::InvalidInput('a'))));
    }

    #[test]
    fn test_transition_preview() {
        let machine = machine(IS_DIV2, "");
        let transition = machine.transition().unwrap();

        assert_eq!(transition.next, "isDiv21");
        assert_eq!(transition.movement, Some(Direction::Left));
    }

    #[test]
    fn test_shared_automaton() {
        let automaton = Arc::new(compile_source(IS_DIV2).unwrap());
        let mut even = TuringMachine::new(automaton.clone(), "110").unwrap();
        let mut odd = TuringMachine::new(automaton.clone(), "111").unwrap();

        assert_eq!(even.run(MAX_EXECUTION_STEPS).outcome, Outcome::Accept);
        assert_eq!(odd.run(MAX_EXECUTION_STEPS).outcome, Outcome::Reject);
        assert!(Arc::ptr_eq(even.automaton(), odd.automaton()));
    }
}
