//! This module provides ways to tweak the local backend, so that some of its sources return errors during tests

/// This stores some behaviour tweaks, that describe how a mocked source will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the SourceRegistry trait
    pub connect_behaviour: (u32, u32),

    // From the CalendarClient trait
    pub create_object_behaviour: (u32, u32),
    pub get_object_behaviour: (u32, u32),
    pub modify_object_behaviour: (u32, u32),
    pub remove_object_behaviour: (u32, u32),
    pub get_object_list_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All actions will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            connect_behaviour: (0, n_fails),
            create_object_behaviour: (0, n_fails),
            get_object_behaviour: (0, n_fails),
            modify_object_behaviour: (0, n_fails),
            remove_object_behaviour: (0, n_fails),
            get_object_list_behaviour: (0, n_fails),
        }
    }

    /// A source that can never be reached
    pub fn unreachable() -> Self {
        Self {
            connect_behaviour: (0, u32::MAX),
            ..Self::default()
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_connect(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.connect_behaviour, "connect")
    }
    pub fn can_create_object(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.create_object_behaviour, "create_object")
    }
    pub fn can_get_object(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.get_object_behaviour, "get_object")
    }
    pub fn can_modify_object(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.modify_object_behaviour, "modify_object")
    }
    pub fn can_remove_object(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.remove_object_behaviour, "remove_object")
    }
    pub fn can_get_object_list(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.get_object_list_behaviour, "get_object_list")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), String> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}
