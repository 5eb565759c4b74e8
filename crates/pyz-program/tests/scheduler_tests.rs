use super::*;
use std::cell::RefCell;
use std::rc::Rc;

type Outcome = Rc<RefCell<Option<ProgramResult<Vec<FileDiagnostics>>>>>;

fn program() -> Program {
    Program::in_memory(&[
        ("a.py", "def f(x: int) -> int: return x\n"),
        ("b.py", "from a import f\ny = f(1)\n"),
        ("c.py", "z: str = 1\n"),
    ])
}

fn record(outcome: &Outcome) -> impl FnOnce(ProgramResult<Vec<FileDiagnostics>>) + 'static {
    let outcome = Rc::clone(outcome);
    move |result| *outcome.borrow_mut() = Some(result)
}

#[test]
fn test_check_yields_between_files() {
    let mut scheduler = Scheduler::new(program());
    let outcome: Outcome = Rc::default();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    scheduler.check_program(record(&outcome));
    let entry = Rc::clone(&log);
    scheduler.query(move |program| {
        entry
            .borrow_mut()
            .push(format!("query after {} checks", program.stats().checks));
    });

    // first file, then the check goes behind the query
    assert!(scheduler.step());
    assert_eq!(scheduler.program().stats().checks, 1);
    assert!(scheduler.step());
    assert_eq!(log.borrow().as_slice(), ["query after 1 checks"]);
    assert!(outcome.borrow().is_none());

    assert_eq!(scheduler.run_until_idle(), 2);
    assert!(!scheduler.step());
    let results = outcome.borrow_mut().take().expect("completed").expect("not cancelled");
    let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["a.py", "b.py", "c.py"]);
    assert!(results[0].diagnostics.is_empty());
    assert_eq!(results[2].diagnostics.len(), 1);
}

#[test]
fn test_update_cancels_a_running_check() {
    let mut scheduler = Scheduler::new(program());
    let outcome: Outcome = Rc::default();
    scheduler.check_program(record(&outcome));
    assert!(scheduler.step());

    scheduler.update_file("a.py", "def f(x: int) -> str: return 'v'\n");
    let seen: Rc<RefCell<Option<String>>> = Rc::default();
    let slot = Rc::clone(&seen);
    scheduler.query(move |program| {
        let b = program.file_id("b.py").expect("b.py");
        let ty = program.get_type_of_symbol(b, "y").ok().flatten();
        *slot.borrow_mut() = ty.map(|ty| program.format_type(ty));
    });
    scheduler.run_until_idle();

    assert_eq!(
        outcome.borrow_mut().take().expect("completed"),
        Err(ProgramError::Cancelled)
    );
    assert_eq!(seen.borrow().as_deref(), Some("str"));
    // the file checked before the cancellation kept its result
    let a = scheduler.program().file_id("a.py").expect("a.py");
    assert_eq!(
        scheduler
            .program()
            .store()
            .unit(a)
            .map(|u| u.stats().checks),
        Some(1)
    );
}

#[test]
fn test_token_cancels_a_queued_check() {
    let mut scheduler = Scheduler::new(program());
    let outcome: Outcome = Rc::default();
    let token = scheduler.check_program(record(&outcome));
    token.cancel();
    assert_eq!(scheduler.run_until_idle(), 1);
    assert_eq!(
        outcome.borrow_mut().take().expect("completed"),
        Err(ProgramError::Cancelled)
    );
    assert_eq!(scheduler.program().stats().checks, 0);
}

#[test]
fn test_removal_is_applied_in_order() {
    let mut scheduler = Scheduler::new(program());
    scheduler.remove_file("c.py");
    let outcome: Outcome = Rc::default();
    scheduler.check_program(record(&outcome));
    assert_eq!(scheduler.pending(), 2);
    scheduler.run_until_idle();

    let results = outcome.borrow_mut().take().expect("completed").expect("not cancelled");
    assert_eq!(results.len(), 2);
    assert!(scheduler.program().file_id("c.py").is_none());
    assert_eq!(scheduler.steps(), 3);
}
