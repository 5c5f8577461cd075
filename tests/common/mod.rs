#![allow(dead_code)]
use basic::dev::DebugDevice;
use basic::mach::{Event, Link, Program, Runtime, Slot, Val};

pub fn runtime(link: Link) -> Runtime<DebugDevice> {
    Runtime::new(program(link), DebugDevice::new())
}

pub fn program(link: Link) -> Program {
    match link.link() {
        Ok(program) => program,
        Err(errors) => panic!("link failed: {:?}", errors),
    }
}

pub fn int(link: &mut Link, n: i16) -> Slot {
    link.constant(Val::Integer(n))
}

pub fn text(link: &mut Link, s: &str) -> Slot {
    link.constant(Val::from(s))
}

pub fn exec(runtime: &mut Runtime<DebugDevice>) -> String {
    exec_n(runtime, 5000)
}

/// Run until the program stops, faults or waits for the host. Faults are
/// appended to the output the way the terminal shows them.
pub fn exec_n(runtime: &mut Runtime<DebugDevice>, cycles: usize) -> String {
    let mut s = String::new();
    let mut prev_yield = false;
    loop {
        let event = runtime.execute(cycles);
        s.push_str(&runtime.device_mut().take_output());
        match event {
            Event::Yield => {
                if prev_yield {
                    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
                    break;
                }
                prev_yield = true;
                continue;
            }
            Event::Fault(error) => s.push_str(&format!("?{}\n", error)),
            Event::Waiting(_) | Event::Stopped => {}
        }
        break;
    }
    s
}
