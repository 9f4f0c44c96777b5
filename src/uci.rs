//! Gambit - UCI Protocol Module
//!
//! Text front end for chess GUIs. Commands drive an `Engine`; `bestmove`
//! is written from the engine's completion callback, so `go` returns at
//! once and `stop` can interrupt it.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::board::STARTING_FEN;
use crate::config::{EngineConfig, SearchMode};
use crate::engine::Engine;
use crate::parallel_search::MAX_THREADS;
use crate::perft::perft_divide;

// Engine identification
const ENGINE_NAME: &str = "Gambit";
const ENGINE_AUTHOR: &str = "the Gambit developers";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entries per unit of the Hash option
const HASH_UNIT: usize = 1000;

/// Budget for `go infinite`, ended by `stop`
const INFINITE_THINK_TIME: Duration = Duration::from_secs(24 * 60 * 60);
const MIN_THINK_TIME: Duration = Duration::from_millis(10);
const MOVES_TO_GO_ESTIMATE: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i64, max: i64 },
    Check,
    Button,
}

/// UCI option representation
#[derive(Clone, Debug)]
pub struct UCIOption {
    pub name: String,
    pub kind: OptionKind,
    pub default: String,
    pub value: String,
}

impl UCIOption {
    fn with_kind(name: &str, kind: OptionKind, default: String) -> Self {
        UCIOption {
            name: name.to_owned(),
            kind,
            value: default.clone(),
            default,
        }
    }

    pub fn spin(name: &str, default: i64, min: i64, max: i64) -> Self {
        UCIOption::with_kind(name, OptionKind::Spin { min, max }, default.to_string())
    }

    pub fn check(name: &str, default: bool) -> Self {
        UCIOption::with_kind(name, OptionKind::Check, default.to_string())
    }

    pub fn button(name: &str) -> Self {
        UCIOption::with_kind(name, OptionKind::Button, String::new())
    }

    pub fn to_uci_string(&self) -> String {
        match self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => {
                format!("option name {} type check default {}", self.name, self.default)
            }
            OptionKind::Button => format!("option name {} type button", self.name),
        }
    }

    /// Store a new value if it parses and fits. Buttons take none.
    pub fn set_value(&mut self, value_str: &str) -> bool {
        match self.kind {
            OptionKind::Spin { min, max } => match value_str.parse::<i64>() {
                Ok(val) if (min..=max).contains(&val) => {
                    self.value = val.to_string();
                    true
                }
                _ => false,
            },
            OptionKind::Check => {
                self.value = value_str.eq_ignore_ascii_case("true").to_string();
                true
            }
            OptionKind::Button => false,
        }
    }

    pub fn get_int(&self) -> i64 {
        self.value.parse().unwrap_or(0)
    }

    pub fn get_bool(&self) -> bool {
        self.value == "true"
    }
}

/// UCI protocol handler writing to `W`
pub struct UCIProtocol<W: Write + Send + 'static> {
    engine: Engine,
    out: Arc<Mutex<W>>,
    running: bool,
    debug_mode: bool,
    options: Vec<UCIOption>,
}

impl UCIProtocol<io::Stdout> {
    pub fn new() -> Self {
        UCIProtocol::with_output(Arc::new(Mutex::new(io::stdout())))
    }
}

impl Default for UCIProtocol<io::Stdout> {
    fn default() -> Self {
        UCIProtocol::new()
    }
}

impl<W: Write + Send + 'static> UCIProtocol<W> {
    pub fn with_output(out: Arc<Mutex<W>>) -> Self {
        let config = EngineConfig::default();
        let options = vec![
            UCIOption::spin("Threads", config.threads as i64, 1, MAX_THREADS as i64),
            UCIOption::spin("Hash", (config.tt_entries / HASH_UNIT) as i64, 1, 100_000),
            UCIOption::check("Parallel", config.search_mode == SearchMode::Parallel),
            UCIOption::spin("MoveTime", config.think_time.as_millis() as i64, 1, 3_600_000),
            UCIOption::button("Clear Hash"),
        ];
        UCIProtocol {
            engine: Engine::new(config),
            out,
            running: true,
            debug_mode: false,
            options,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run<R: BufRead>(&mut self, input: R) {
        for line in input.lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if !line.is_empty() {
                self.process_command(line);
            }
            if !self.running {
                break;
            }
        }
        self.engine.quit();
    }

    pub fn process_command(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return;
        };
        debug!(command = line, "uci command");

        match command {
            "uci" => self.cmd_uci(),
            "isready" => self.send("readyok"),
            "setoption" => self.cmd_setoption(args),
            "ucinewgame" => self.engine.new_game(),
            "position" => self.cmd_position(args),
            "go" => self.cmd_go(args),
            "stop" => self.engine.stop_thinking(),
            "quit" => self.cmd_quit(),
            "debug" => self.debug_mode = args.first() == Some(&"on"),
            "d" => self.cmd_display(),
            "perft" => self.cmd_perft(args),
            _ => {
                if self.debug_mode {
                    self.send(&format!("info string Unknown command: {}", command));
                }
            }
        }
    }

    fn send(&self, message: &str) {
        write_line(&self.out, message);
    }

    fn cmd_uci(&self) {
        self.send(&format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));
        self.send(&format!("id author {}", ENGINE_AUTHOR));
        for option in &self.options {
            self.send(&option.to_uci_string());
        }
        self.send("uciok");
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        if args.len() < 2 || args[0] != "name" {
            return;
        }

        let value_pos = args.iter().position(|&a| a == "value");
        let name = args[1..value_pos.unwrap_or(args.len())].join(" ");
        let value = value_pos.map(|i| args[i + 1..].join(" "));

        let found = self.options.iter_mut().find(|o| o.name.eq_ignore_ascii_case(&name));
        let Some(option) = found else {
            self.send(&format!("info string Unknown option: {}", name));
            return;
        };

        if option.kind == OptionKind::Button {
            if option.name == "Clear Hash" {
                self.engine.clear_hash();
                if self.debug_mode {
                    self.send("info string Hash table cleared");
                }
            }
            return;
        }

        match value {
            Some(v) if option.set_value(&v) => {
                let msg = format!("info string Option {} set to {}", option.name, option.value);
                self.apply_options();
                if self.debug_mode {
                    self.send(&msg);
                }
            }
            _ => {
                warn!(option = %name, "rejected option value");
                self.send(&format!("info string Invalid value for option {}", name));
            }
        }
    }

    fn apply_options(&mut self) {
        let mut config = self.engine.config().clone();
        for opt in &self.options {
            match opt.name.as_str() {
                "Threads" => config.threads = opt.get_int().max(1) as usize,
                "Hash" => config.tt_entries = opt.get_int().max(1) as usize * HASH_UNIT,
                "Parallel" => {
                    config.search_mode = if opt.get_bool() {
                        SearchMode::Parallel
                    } else {
                        SearchMode::Serial
                    }
                }
                "MoveTime" => {
                    config.think_time = Duration::from_millis(opt.get_int().max(1) as u64)
                }
                _ => {}
            }
        }
        if &config != self.engine.config() {
            self.engine.set_config(config);
        }
    }

    fn cmd_position(&mut self, args: &[&str]) {
        let moves_pos = args.iter().position(|&a| a == "moves");
        let setup = &args[..moves_pos.unwrap_or(args.len())];

        let loaded = match setup.split_first() {
            Some((&"startpos", _)) => self.engine.set_position(STARTING_FEN),
            Some((&"fen", fields)) => self.engine.set_position(&fields.join(" ")),
            _ => return,
        };
        if let Err(e) = loaded {
            warn!(error = %e, "position rejected");
            self.send(&format!("info string {}", e));
            return;
        }

        if let Some(i) = moves_pos {
            for move_str in &args[i + 1..] {
                if let Err(e) = self.engine.make_move(move_str) {
                    warn!(error = %e, "move rejected");
                    self.send(&format!("info string {}", e));
                    break;
                }
            }
        }
    }

    fn cmd_go(&mut self, args: &[&str]) {
        let mut movetime = None;
        let mut infinite = false;
        let (mut wtime, mut btime, mut winc, mut binc) = (None, None, 0u64, 0u64);

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1).and_then(|s| s.parse::<u64>().ok());
            match args[i] {
                "infinite" => {
                    infinite = true;
                    i += 1;
                    continue;
                }
                "movetime" => movetime = value,
                "wtime" => wtime = value,
                "btime" => btime = value,
                "winc" => winc = value.unwrap_or(0),
                "binc" => binc = value.unwrap_or(0),
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        let white = self.engine.board().white_to_move;
        let clock = if white { wtime.map(|t| (t, winc)) } else { btime.map(|t| (t, binc)) };

        let budget = if infinite {
            INFINITE_THINK_TIME
        } else if let Some(ms) = movetime {
            Duration::from_millis(ms)
        } else if let Some((remaining, inc)) = clock {
            Duration::from_millis(remaining / MOVES_TO_GO_ESTIMATE + inc / 2)
        } else {
            self.engine.config().think_time
        };
        let budget = budget.max(MIN_THINK_TIME);

        let out = Arc::clone(&self.out);
        self.engine.start_thinking_for(budget, move |mv| {
            write_line(&out, &format!("bestmove {}", mv.to_uci()));
        });
    }

    fn cmd_quit(&mut self) {
        self.engine.quit();
        self.running = false;
    }

    fn cmd_display(&self) {
        self.send(&self.engine.board().to_string());
        self.send(&format!("Result: {}", self.engine.game_result()));
    }

    fn cmd_perft(&self, args: &[&str]) {
        let depth = args.first().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1);

        let mut board = self.engine.board().clone();
        let divide = perft_divide(&mut board, depth);
        let mut total = 0u64;
        for (mv, nodes) in &divide {
            self.send(&format!("{}: {}", mv, nodes));
            total += nodes;
        }
        self.send("");
        self.send(&format!("Nodes searched: {}", total));
    }
}

fn write_line<W: Write>(out: &Mutex<W>, message: &str) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(out, "{}", message).ok();
    out.flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generator::is_legal;
    use crate::moves::Move;

    fn protocol() -> (UCIProtocol<Vec<u8>>, Arc<Mutex<Vec<u8>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        (UCIProtocol::with_output(Arc::clone(&out)), out)
    }

    fn take_output(out: &Arc<Mutex<Vec<u8>>>) -> String {
        let mut buf = out.lock().unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        buf.clear();
        text
    }

    #[test]
    fn test_handshake_lists_options() {
        let (mut uci, out) = protocol();
        uci.process_command("uci");
        uci.process_command("isready");
        let text = take_output(&out);
        assert!(text.starts_with("id name Gambit"));
        assert!(text.contains("option name Threads type spin"));
        assert!(text.contains("option name Parallel type check default false"));
        assert!(text.contains("option name Clear Hash type button"));
        assert!(text.contains("uciok\nreadyok\n"));
    }

    #[test]
    fn test_position_with_moves() {
        let (mut uci, _out) = protocol();
        uci.process_command("position startpos moves e2e4 c7c5 g1f3");
        assert_eq!(
            uci.engine().current_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );

        uci.process_command("position fen 4k3/8/8/8/8/8/8/4K2R w K - 0 1 moves e1g1");
        assert_eq!(uci.engine().current_fen(), "4k3/8/8/8/8/8/8/5RK1 b - - 1 1");
    }

    #[test]
    fn test_illegal_move_stops_move_list() {
        let (mut uci, out) = protocol();
        uci.process_command("position startpos moves e2e4 e2e4 d7d5");
        assert!(take_output(&out).contains("info string"));
        assert_eq!(uci.engine().board().ply_count, 1);
    }

    #[test]
    fn test_go_writes_legal_bestmove() {
        let (mut uci, out) = protocol();
        uci.process_command("position startpos moves d2d4");
        uci.process_command("go movetime 50");
        uci.engine_mut().wait();

        let text = take_output(&out);
        let line = text.lines().find(|l| l.starts_with("bestmove ")).unwrap();
        let mv = Move::from_uci(&line["bestmove ".len()..], uci.engine().board()).unwrap();
        assert!(is_legal(uci.engine().board(), mv));
    }

    #[test]
    fn test_setoption_updates_config() {
        let (mut uci, out) = protocol();
        uci.process_command("setoption name Threads value 2");
        uci.process_command("setoption name Parallel value true");
        uci.process_command("setoption name Hash value 16");
        uci.process_command("setoption name MoveTime value 250");
        let config = uci.engine().config();
        assert_eq!(config.threads, 2);
        assert_eq!(config.search_mode, SearchMode::Parallel);
        assert_eq!(config.tt_entries, 16_000);
        assert_eq!(config.think_time, Duration::from_millis(250));

        uci.process_command("setoption name Threads value 0");
        assert!(take_output(&out).contains("Invalid value for option Threads"));
        assert_eq!(uci.engine().config().threads, 2);
    }

    #[test]
    fn test_perft_command() {
        let (mut uci, out) = protocol();
        uci.process_command("perft 2");
        let text = take_output(&out);
        assert!(text.contains("e2e4: 20"));
        assert!(text.trim_end().ends_with("Nodes searched: 400"));
    }

    #[test]
    fn test_quit_stops_loop() {
        let (mut uci, out) = protocol();
        uci.run("isready\nquit\nisready\n".as_bytes());
        assert!(!uci.is_running());
        assert_eq!(take_output(&out), "readyok\n");
    }
}
