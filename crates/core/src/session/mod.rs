//! Session controller
//!
//! Owns the current rule mode, side to move, castling rights, edit-mode
//! scratch board and the position string that is the session's source of
//! truth. Drives the codec, the oracle, the bot and the synchronization
//! channel in response to user actions and incoming messages. Every
//! validation failure is recovered here; the session always keeps its
//! last-known-good position.

use rand::Rng;
use shakmaty::{Color, Piece, Role, Square};

use crate::codec::{self, freeform, CastlingRights, EditorBoard};
use crate::engine;
use crate::error::{Error, Result};
use crate::oracle::{describe_move, move_endpoints, GameStatus, Oracle};
use crate::sync::{Channel, MoveMessage, RoomCode, Transport, MOVE_KIND};
use crate::STARTING_EXCHANGE;

/// Which rule regime governs play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Moves go through the rule oracle.
    Validated,
    /// Anything goes; pieces teleport and capture freely.
    Freeform,
}

struct PeerLink {
    channel: Box<dyn Channel>,
    color: Color,
    room: RoomCode,
}

pub struct Session {
    mode: RuleMode,
    turn: Color,
    castling: CastlingRights,
    /// Exchange string in validated mode, freeform string otherwise.
    position: String,
    scratch: Option<EditorBoard>,
    link: Option<PeerLink>,
    status: Option<String>,
}

impl Session {
    /// A fresh session at the standard starting position.
    pub fn new() -> Self {
        Self {
            mode: RuleMode::Validated,
            turn: Color::White,
            castling: CastlingRights::all(),
            position: STARTING_EXCHANGE.to_string(),
            scratch: None,
            link: None,
            status: None,
        }
    }

    /// A session starting from an arbitrary exchange string, checked
    /// against the oracle.
    pub fn from_exchange(exchange: &str) -> Result<Self> {
        Oracle::load(exchange)?;
        let decoded = codec::decode(exchange)?;
        Ok(Self {
            mode: RuleMode::Validated,
            turn: decoded.turn,
            castling: decoded.castling,
            position: exchange.to_string(),
            scratch: None,
            link: None,
            status: None,
        })
    }

    pub fn mode(&self) -> RuleMode {
        self.mode
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.scratch.is_some()
    }

    fn current_board(&self) -> Result<EditorBoard> {
        if freeform::is_freeform(&self.position) {
            freeform::decode(&self.position).map(|d| d.board)
        } else {
            codec::decode(&self.position).map(|d| d.board)
        }
    }

    /// Enters edit mode with a scratch board pre-filled from the current
    /// position, or empty if the current string cannot be read back.
    pub fn enter_edit(&mut self) {
        if self.scratch.is_none() {
            self.scratch = Some(self.current_board().unwrap_or_default());
        }
    }

    pub fn place(&mut self, square: Square, piece: Piece) {
        if let Some(board) = self.scratch.as_mut() {
            board.place(square, piece);
        }
    }

    pub fn erase(&mut self, square: Square) {
        if let Some(board) = self.scratch.as_mut() {
            board.erase(square);
        }
    }

    /// Discards the scratch board without touching the committed position.
    pub fn cancel_edit(&mut self) {
        self.scratch = None;
    }

    /// Commits the scratch board as the new position.
    ///
    /// In validated mode the board must pass the codec invariants and load
    /// into the oracle; any failure leaves the scratch and the previous
    /// position intact. A freeform commit accepts anything.
    pub fn commit_edit(&mut self, mode: RuleMode, turn: Color, castling: CastlingRights) -> Result<()> {
        let board = match self.scratch.as_ref() {
            Some(board) => board,
            None => {
                tracing::debug!("commit without an active edit ignored");
                return Ok(());
            }
        };

        match mode {
            RuleMode::Validated => {
                let exchange = codec::encode(board, turn, castling)?;
                if let Err(e) = Oracle::load(&exchange) {
                    self.status = Some(format!("position not playable: {}", e));
                    return Err(e);
                }
                self.position = exchange;
                self.castling = castling;
            }
            RuleMode::Freeform => {
                self.position = freeform::encode(board, turn);
                self.castling = CastlingRights::none();
            }
        }

        self.mode = mode;
        self.turn = turn;
        self.scratch = None;
        self.status = None;
        Ok(())
    }

    /// Attempts a move by its endpoints.
    ///
    /// Validated mode asks the oracle; a rejection changes nothing and is
    /// reported so the UI can refuse the drag. Freeform mode moves the piece
    /// with no questions asked, capture-by-replacement. An accepted move is
    /// published to the peer, if any.
    pub fn try_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<GameStatus> {
        match self.mode {
            RuleMode::Validated => {
                let mut oracle = Oracle::load(&self.position)?;
                let m = oracle.apply(from, to, promotion)?;
                let description = describe_move(&m);
                let resulting = oracle.exchange_string();
                let status = oracle.status();
                self.adopt_exchange(&resulting);
                self.note_termination(status);
                self.publish(from, to, description, resulting);
                Ok(status)
            }
            RuleMode::Freeform => {
                let mut board = self.current_board()?;
                let piece = board.erase(from).ok_or_else(|| {
                    Error::OracleRejectedMove(format!("no piece on {}", from))
                })?;
                board.place(to, piece);
                self.turn = !self.turn;
                self.position = freeform::encode(&board, self.turn);
                let description = format!("{}{}", from, to);
                self.publish(from, to, description, self.position.clone());
                Ok(GameStatus::Ongoing)
            }
        }
    }

    /// Lets the bot take the current turn. Returns the status after its
    /// move, or `None` when there is nothing to play (game over, or the
    /// session is in freeform mode, where the bot has no rule oracle to
    /// consult).
    pub fn bot_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<GameStatus>> {
        if self.mode != RuleMode::Validated {
            return Ok(None);
        }
        let chosen = match engine::select_move(&self.position, self.turn, rng)? {
            Some(m) => m,
            None => return Ok(None),
        };
        let (from, to) = move_endpoints(&chosen)
            .ok_or_else(|| Error::OracleRejectedMove("unplayable move".to_string()))?;
        let promotion = match chosen {
            shakmaty::Move::Normal { promotion, .. } => promotion,
            _ => None,
        };
        self.try_move(from, to, promotion).map(Some)
    }

    /// Creates a room: mints a code, opens the channel, plays white.
    pub fn host_room<R: Rng + ?Sized>(
        &mut self,
        transport: Option<&dyn Transport>,
        rng: &mut R,
    ) -> Result<RoomCode> {
        let transport = transport.ok_or(Error::ChannelUnavailable)?;
        let room = RoomCode::generate(rng);
        let channel = transport.open_channel(&room)?;
        self.link = Some(PeerLink {
            channel,
            color: Color::White,
            room: room.clone(),
        });
        Ok(room)
    }

    /// Joins an existing room; the joiner plays black.
    pub fn join_room(&mut self, transport: Option<&dyn Transport>, room: &RoomCode) -> Result<()> {
        let transport = transport.ok_or(Error::ChannelUnavailable)?;
        let channel = transport.open_channel(room)?;
        self.link = Some(PeerLink {
            channel,
            color: Color::Black,
            room: room.clone(),
        });
        Ok(())
    }

    pub fn is_online(&self) -> bool {
        self.link.is_some()
    }

    pub fn local_color(&self) -> Option<Color> {
        self.link.as_ref().map(|link| link.color)
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.link.as_ref().map(|link| &link.room)
    }

    /// Drains the channel and applies every well-formed "move" message.
    /// Returns the number of messages applied.
    pub fn pump(&mut self) -> usize {
        let mut batch = Vec::new();
        if let Some(link) = self.link.as_mut() {
            while let Some(incoming) = link.channel.try_recv() {
                batch.push(incoming);
            }
        }

        let mut applied = 0;
        for (kind, payload) in batch {
            if kind != MOVE_KIND {
                tracing::debug!("ignoring message of unknown kind '{}'", kind);
                continue;
            }
            match serde_json::from_value::<MoveMessage>(payload) {
                Ok(msg) => {
                    if self.ingest_remote(&msg) {
                        applied += 1;
                    }
                }
                Err(e) => {
                    tracing::debug!("discarding malformed move message: {}", e);
                }
            }
        }
        applied
    }

    /// Applies a remote move message: wholesale position replacement.
    ///
    /// Freeform positions are adopted without legality checks; exchange
    /// strings must load into the oracle or the message is dropped.
    pub fn ingest_remote(&mut self, msg: &MoveMessage) -> bool {
        if freeform::is_freeform(&msg.resulting_position) {
            match freeform::decode(&msg.resulting_position) {
                Ok(decoded) => {
                    self.position = msg.resulting_position.clone();
                    self.mode = RuleMode::Freeform;
                    self.turn = decoded.turn;
                    self.castling = CastlingRights::none();
                    self.status = Some(format!("peer played {}", msg.description));
                    true
                }
                Err(e) => {
                    tracing::debug!("dropping unreadable freeform position: {}", e);
                    false
                }
            }
        } else {
            match Oracle::load(&msg.resulting_position) {
                Ok(oracle) => {
                    self.adopt_exchange(&msg.resulting_position);
                    self.note_termination(oracle.status());
                    if self.status.is_none() {
                        self.status = Some(format!("peer played {}", msg.description));
                    }
                    true
                }
                Err(e) => {
                    tracing::debug!("dropping remote position the oracle rejected: {}", e);
                    self.status = Some("ignored an invalid remote move".to_string());
                    false
                }
            }
        }
    }

    fn adopt_exchange(&mut self, exchange: &str) {
        if let Ok(decoded) = codec::decode(exchange) {
            self.turn = decoded.turn;
            self.castling = decoded.castling;
        }
        self.position = exchange.to_string();
        self.mode = RuleMode::Validated;
        self.status = None;
    }

    fn note_termination(&mut self, status: GameStatus) {
        match status {
            GameStatus::Checkmate => self.status = Some("checkmate".to_string()),
            GameStatus::Stalemate => self.status = Some("stalemate".to_string()),
            GameStatus::Ongoing => {}
        }
    }

    fn publish(&mut self, from: Square, to: Square, description: String, resulting: String) {
        let link = match self.link.as_mut() {
            Some(link) => link,
            None => return,
        };
        let msg = MoveMessage {
            from,
            to,
            description,
            resulting_position: resulting,
        };
        match serde_json::to_value(&msg) {
            Ok(payload) => link.channel.send(MOVE_KIND, payload),
            Err(e) => tracing::debug!("failed to serialize move message: {}", e),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
