//! Channel membership and channel modes.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::casemap::irc_to_lower;
use crate::mode::Mode;
use crate::state::{Server, User};

/// A joined channel on one server.
///
/// Members and modes sit behind separate locks, so a NAMES burst doesn't
/// contend with a concurrent mode change.
#[derive(Debug)]
pub struct Channel {
    server: Arc<Server>,
    name: String,
    users: Mutex<Vec<User>>,
    modes: Mutex<Vec<Mode>>,
}

impl Channel {
    /// Create an empty channel. The name is case-folded.
    pub fn new(server: Arc<Server>, name: &str) -> Self {
        Self {
            server,
            name: irc_to_lower(name),
            users: Mutex::new(Vec::new()),
            modes: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Add `user` unless an equal user is already a member.
    pub fn add_user(&self, user: User) -> bool {
        let mut users = self.users.lock();
        if users.contains(&user) {
            return false;
        }
        users.push(user);
        true
    }

    /// Remove a member equal to `user`. Absent users are ignored.
    pub fn remove_user(&self, user: &User) -> bool {
        let mut users = self.users.lock();
        let before = users.len();
        users.retain(|u| u != user);
        users.len() != before
    }

    /// Remove the member record for `nick`.
    pub fn remove_nick(&self, nick: &str) -> bool {
        self.remove_user(&User::member(nick))
    }

    /// Look up a member by nick.
    pub fn find_user(&self, nick: &str) -> Option<User> {
        let key = User::member(nick);
        self.users.lock().iter().find(|u| **u == key).cloned()
    }

    pub fn in_channel(&self, nick: &str) -> bool {
        self.find_user(nick).is_some()
    }

    /// Apply a status mode to the member named by `nick`.
    /// Returns false if there is no such member or the mode isn't a status.
    pub fn apply_user_mode(&self, nick: &str, mode: &Mode) -> bool {
        let key = User::member(nick);
        let mut users = self.users.lock();
        match users.iter_mut().find(|u| **u == key) {
            Some(user) if mode.on => user.add_mode(mode),
            Some(user) => user.remove_mode(mode),
            None => false,
        }
    }

    /// Rename a member, keeping its status.
    pub fn rename_user(&self, old: &str, new: &str) -> bool {
        let key = User::member(old);
        let mut users = self.users.lock();
        match users.iter_mut().find(|u| **u == key) {
            Some(user) => {
                user.rename(new);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current members.
    pub fn users(&self) -> Vec<User> {
        self.users.lock().clone()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }

    /// Set a channel mode. An existing mode with the same character has its
    /// parameter replaced.
    pub fn add_mode(&self, mode: Mode) {
        let mut modes = self.modes.lock();
        match modes.iter_mut().find(|m| **m == mode) {
            Some(existing) => existing.param = mode.param,
            None => modes.push(mode),
        }
    }

    /// Clear a channel mode. Absent modes are ignored.
    pub fn remove_mode(&self, mode: &Mode) -> bool {
        let mut modes = self.modes.lock();
        let before = modes.len();
        modes.retain(|m| m != mode);
        modes.len() != before
    }

    pub fn has_mode(&self, character: char) -> bool {
        self.modes.lock().iter().any(|m| m.character == character)
    }

    /// Snapshot of the current channel modes.
    pub fn modes(&self) -> Vec<Mode> {
        self.modes.lock().clone()
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && *self.server == *other.server
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
