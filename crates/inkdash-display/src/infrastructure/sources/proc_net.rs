//! Network counters read from the Linux `/proc/net` tables.

use std::path::PathBuf;

use super::{CounterSource, InterfaceCounters, SourceError};

/// Socket tables counted towards the connection total.
const SOCKET_TABLES: [&str; 4] = ["tcp", "tcp6", "udp", "udp6"];

/// [`CounterSource`] reading `<root>/net/dev` and the socket tables.
///
/// `root` is `/proc` in production; tests point it at a temporary directory.
pub struct ProcNetSource {
    root: PathBuf,
}

impl ProcNetSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: &str) -> Result<String, SourceError> {
        let path = self.root.join("net").join(name);
        std::fs::read_to_string(&path).map_err(|source| SourceError::Io { path, source })
    }
}

impl Default for ProcNetSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the body of `/proc/net/dev`.
///
/// After the two header lines each row is `iface: rx_bytes rx_packets … tx_bytes …`
/// where `tx_bytes` is the ninth counter.
pub fn parse_net_dev(text: &str) -> Result<Vec<InterfaceCounters>, SourceError> {
    let mut out = Vec::new();
    for line in text.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(SourceError::BadResponse(format!(
                "net/dev row for {} has {} fields",
                name.trim(),
                fields.len()
            )));
        }
        let parse = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| SourceError::BadResponse(format!("bad counter {s:?} in net/dev")))
        };
        out.push(InterfaceCounters {
            name: name.trim().to_string(),
            rx_bytes: parse(fields[0])?,
            tx_bytes: parse(fields[8])?,
        });
    }
    Ok(out)
}

/// Number of socket rows in a `/proc/net/{tcp,udp}*` table.
fn count_sockets(text: &str) -> usize {
    text.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
}

impl CounterSource for ProcNetSource {
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>, SourceError> {
        parse_net_dev(&self.read("dev")?)
    }

    fn connection_count(&self) -> Result<usize, SourceError> {
        let mut total = 0;
        for table in SOCKET_TABLES {
            match self.read(table) {
                Ok(text) => total += count_sockets(&text),
                // IPv6 tables are absent on kernels built without IPv6.
                Err(SourceError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  104857     800    0    0    0     0          0         0   104857     800    0    0    0     0       0          0
  eth0: 5242880    4000    0    0    0     0          0        12  1048576    2500    0    0    0     0       0          0
 wlan0:    2048      10    0    0    0     0          0         0     4096      20    0    0    0     0       0          0
";

    const TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:0277 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1234 1
   1: 0F02000A:0016 0202000A:C35A 01 00000000:00000000 02:0009A5F2 00000000     0        0 5678 4
";

    fn temp_proc(files: &[(&str, &str)]) -> PathBuf {
        let root = std::env::temp_dir().join(format!("inkdash-proc-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("net")).unwrap();
        for (name, body) in files {
            std::fs::write(root.join("net").join(name), body).unwrap();
        }
        root
    }

    #[test]
    fn test_parse_net_dev_reads_rx_and_tx() {
        // Act
        let ifaces = parse_net_dev(NET_DEV).unwrap();

        // Assert
        assert_eq!(ifaces.len(), 3);
        assert_eq!(ifaces[1].name, "eth0");
        assert_eq!(ifaces[1].rx_bytes, 5_242_880);
        assert_eq!(ifaces[1].tx_bytes, 1_048_576);
        assert_eq!(ifaces[1].total(), 6_291_456);
    }

    #[test]
    fn test_parse_net_dev_rejects_short_rows() {
        let text = "h1\nh2\n  eth0: 1 2 3\n";
        assert!(matches!(parse_net_dev(text), Err(SourceError::BadResponse(_))));
    }

    #[test]
    fn test_connection_count_skips_missing_tables() {
        // Arrange: only tcp and udp exist
        let root = temp_proc(&[("dev", NET_DEV), ("tcp", TCP), ("udp", "  sl  local_address\n")]);
        let source = ProcNetSource::with_root(&root);

        // Act
        let count = source.connection_count().unwrap();

        // Assert
        assert_eq!(count, 2);
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_missing_net_dev_is_io_error() {
        let root = temp_proc(&[]);
        let source = ProcNetSource::with_root(&root);
        assert!(matches!(source.interfaces(), Err(SourceError::Io { .. })));
        std::fs::remove_dir_all(root).ok();
    }
}
