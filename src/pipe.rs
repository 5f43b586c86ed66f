//! SIGPIPE handling for programs running as systemd services.
//!
//! systemd counts an exit by SIGPIPE as successful (its default
//! `SuccessExitStatus=` includes it), so such a service is not restarted.
//! A service's stdout and stderr are usually connected to journald, and when
//! journald restarts, the next write to either stream raises SIGPIPE. A
//! process with the default disposition dies there and stays dead.
//!
//! When running under systemd we install a handler that swallows SIGPIPE for
//! every descriptor. The failing write then surfaces as an ordinary
//! `EPIPE` I/O error that the program can log or act upon.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Set by systemd when stdout or stderr is connected to the journal.
pub const JOURNAL_STREAM_ENV: &str = "JOURNAL_STREAM";

const CGROUP_PATH: &str = "/proc/self/cgroup";

/// Returns true if the program runs as a systemd service.
///
/// Any failure while inspecting the process resolves to false.
pub fn is_systemd_service() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }
    if std::env::var_os(JOURNAL_STREAM_ENV).is_some_and(|v| !v.is_empty()) {
        return true;
    }
    is_systemd_cgroup_file(CGROUP_PATH)
}

/// Inspects a cgroup membership file such as `/proc/self/cgroup`.
pub fn is_systemd_cgroup_file(path: impl AsRef<Path>) -> bool {
    match File::open(path) {
        Ok(file) => is_systemd_cgroup(BufReader::new(file)),
        Err(_) => false,
    }
}

/// Returns true if the `name=systemd` hierarchy places the process in a
/// `.service` unit.
///
/// Each line reads `id:controllers:path`. Lines are compared as raw bytes and
/// reading stops at the first `name=systemd` line, which alone decides. A
/// read error before that line resolves to false.
pub fn is_systemd_cgroup(reader: impl BufRead) -> bool {
    for line in reader.split(b'\n') {
        let Ok(line) = line else {
            return false;
        };
        let mut fields = line.splitn(3, |b| *b == b':');
        let (Some(_id), Some(controllers), Some(path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if controllers == b"name=systemd" {
            return path.ends_with(b".service");
        }
    }
    false
}

/// Swallows SIGPIPE if the program runs as a systemd service.
///
/// Returns true when the guard was installed. The handler replaces whatever
/// disposition SIGPIPE had, `SIG_DFL` included, and stays for the lifetime of
/// the process. Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn handle_sigpipe() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    use crate::log::{log_debug, log_info, log_warn};

    if !is_systemd_service() {
        return false;
    }
    if tokio::runtime::Handle::try_current().is_err() {
        log_warn!("no tokio runtime, SIGPIPE guard not installed");
        return false;
    }
    let mut sigpipe = match signal(SignalKind::pipe()) {
        Ok(sigpipe) => sigpipe,
        Err(err) => {
            log_warn!("failed to install SIGPIPE guard: {err}");
            return false;
        }
    };
    log_info!("running as a systemd service, SIGPIPE will be ignored");
    tokio::spawn(async move {
        while sigpipe.recv().await.is_some() {
            log_debug!("SIGPIPE swallowed");
        }
    });
    true
}

#[cfg(not(unix))]
pub fn handle_sigpipe() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};

    use tempfile::NamedTempFile;

    use super::*;

    fn cgroup_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // Yields `data`, then fails on the next read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("read failed")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn service_unit_is_detected() {
        let file = cgroup_file(
            "5:cpuacct,cpu:/system.slice/foo.service\n4:name=systemd:/system.slice/foo.service\n",
        );
        assert!(is_systemd_cgroup_file(file.path()));
    }

    #[test]
    fn scope_unit_is_not_a_service() {
        let file = cgroup_file("4:name=systemd:/user.slice/user-1000.slice/session-2.scope\n");
        assert!(!is_systemd_cgroup_file(file.path()));
    }

    #[test]
    fn missing_file_is_not_a_service() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_systemd_cgroup_file(dir.path().join("cgroup")));
    }

    #[test]
    fn only_the_first_systemd_line_counts() {
        let content = "1:name=systemd:/init.scope\n2:name=systemd:/system.slice/late.service\n";
        assert!(!is_systemd_cgroup(Cursor::new(content)));
    }

    #[test]
    fn other_hierarchies_and_malformed_lines_are_ignored() {
        let content = "garbage\n0::/system.slice/foo.service\n3:memory:/system.slice/foo.service\n";
        assert!(!is_systemd_cgroup(Cursor::new(content)));
    }

    #[test]
    fn last_line_without_newline_is_read() {
        let content = "4:name=systemd:/system.slice/foo.service";
        assert!(is_systemd_cgroup(Cursor::new(content)));
    }

    #[test]
    fn invalid_utf8_does_not_hide_the_deciding_line() {
        let after: &[u8] = b"1:name=systemd:/system.slice/foo.service\n2:memory:/\xff\n";
        assert!(is_systemd_cgroup(after));

        let before: &[u8] = b"2:memory:/\xff\n1:name=systemd:/system.slice/foo.service\n";
        assert!(is_systemd_cgroup(before));

        let in_path: &[u8] = b"4:name=systemd:/system.slice/\xff.service\n";
        assert!(is_systemd_cgroup(in_path));
    }

    #[test]
    fn read_error_is_not_a_service() {
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(b"3:memory:/system.slice/foo.service\n".to_vec()),
        });
        assert!(!is_systemd_cgroup(reader));
    }

    #[test]
    fn read_error_after_the_deciding_line_is_ignored() {
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(b"4:name=systemd:/system.slice/foo.service\n".to_vec()),
        });
        assert!(is_systemd_cgroup(reader));
    }
}
