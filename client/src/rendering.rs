use crate::config::GameConfig;
use crate::input::LocalUiState;
use macroquad::prelude::*;
use shared::coords::{self, Size, Vec2};
use shared::{BulletState, PlayerState, RoomInfo, Snapshot};

const BACKGROUND: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const BOUNDARY: Color = Color::new(1.0, 0.0, 0.0, 1.0);
const LOCAL_PLAYER: Color = Color::new(0.0, 1.0, 0.0, 1.0);
const OTHER_PLAYER: Color = Color::new(0.0, 0.0, 1.0, 1.0);
const DEAD_PLAYER: Color = Color::new(0.4, 0.4, 0.4, 1.0);
const OUTLINE: Color = Color::new(0.133, 0.133, 0.133, 1.0);
const HEALTH_BACKGROUND: Color = Color::new(0.133, 0.133, 0.133, 1.0);
const ALERT: Color = Color::new(1.0, 0.267, 0.267, 1.0);
const LABEL: Color = Color::new(1.0, 1.0, 1.0, 1.0);
const KILLS: Color = Color::new(1.0, 1.0, 0.0, 1.0);
const LOCAL_BULLET: Color = Color::new(1.0, 1.0, 0.0, 1.0);
const AIM_READY: Color = Color::new(1.0, 1.0, 1.0, 0.3);
const AIM_COOLING: Color = Color::new(1.0, 0.0, 0.0, 0.2);
const HUD_TEXT: Color = Color::new(0.9, 0.9, 0.9, 1.0);

const BOUNDARY_THICKNESS: f32 = 2.0;
const HEALTH_BAR_HEIGHT: f32 = 4.0;
const NAME_FONT: f32 = 12.0;
const SMALL_FONT: f32 = 10.0;
const COOLDOWN_FONT: f32 = 16.0;
const PROMPT_FONT: f32 = 24.0;
const HUD_FONT: f32 = 16.0;

pub const DEATH_PROMPT: &str = "You are dead! Press R to respawn";
pub const DEAD_LABEL: &str = "DEAD";
pub const WAITING_TEXT: &str = "Waiting for game state...";
pub const EXIT_HINT: &str = "Press Enter or Escape to quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// One drawing primitive in render-space pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    RectOutline {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        thickness: f32,
        color: Color,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Color,
        outline: Option<Color>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
        align: TextAlign,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Line { .. }))
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Circle { .. }))
    }
}

/// Everything a frame depends on
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub snapshot: Option<&'a Snapshot>,
    pub local_player_id: &'a str,
    pub ui: LocalUiState,
    pub render_size: Size,
    pub notice: Option<&'a str>,
}

/// Builds the frame for the latest snapshot; pure and deterministic
pub fn build_frame(input: &FrameInput<'_>, config: &GameConfig) -> Frame {
    let mut builder = FrameBuilder {
        frame: Frame::default(),
        config,
        render: input.render_size,
        local_player_id: input.local_player_id,
    };
    builder.frame.push(DrawCommand::Clear(BACKGROUND));
    if input.render_size.is_degenerate() {
        return builder.frame;
    }

    builder.draw_boundary();

    match input.snapshot {
        Some(snapshot) => {
            let local = snapshot.player(input.local_player_id);

            for (id, player) in &snapshot.players {
                builder.draw_player(id, player);
            }
            if let (Some(me), Some(pointer)) = (local, input.ui.drag) {
                if me.is_alive() {
                    builder.draw_aim_preview(me, pointer, input.ui.cooldown_remaining.is_zero());
                }
            }
            for bullet in &snapshot.bullets {
                builder.draw_bullet(bullet);
            }
            if let Some(me) = local {
                builder.draw_local_overlay(me, &input.ui);
            }
            if let Some(room) = &snapshot.room_info {
                builder.draw_room_hud(room);
            }
        }
        None => builder.centered_text(WAITING_TEXT, PROMPT_FONT, HUD_TEXT),
    }

    if let Some(notice) = input.notice {
        builder.text(
            notice,
            input.render_size.width / 2.0,
            24.0,
            HUD_FONT,
            ALERT,
            TextAlign::Center,
        );
    }

    builder.frame
}

/// Full-screen notice shown after the session ends
pub fn build_exit_frame(message: &str, render_size: Size) -> Frame {
    let mut frame = Frame::default();
    frame.push(DrawCommand::Clear(BACKGROUND));
    if render_size.is_degenerate() {
        return frame;
    }
    let x = render_size.width / 2.0;
    let y = render_size.height / 2.0;
    frame.push(DrawCommand::Text {
        text: message.to_string(),
        x,
        y,
        font_size: PROMPT_FONT,
        color: ALERT,
        align: TextAlign::Center,
    });
    frame.push(DrawCommand::Text {
        text: EXIT_HINT.to_string(),
        x,
        y: y + PROMPT_FONT + 8.0,
        font_size: HUD_FONT,
        color: HUD_TEXT,
        align: TextAlign::Center,
    });
    frame
}

struct FrameBuilder<'a> {
    frame: Frame,
    config: &'a GameConfig,
    render: Size,
    local_player_id: &'a str,
}

impl FrameBuilder<'_> {
    fn to_render(&self, x: f32, y: f32) -> Vec2 {
        coords::to_render(Vec2::new(x, y), self.render, self.config.world)
    }

    fn length(&self, world_length: f32) -> f32 {
        coords::length_to_render(world_length, self.render, self.config.world)
    }

    fn text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Color, align: TextAlign) {
        self.frame.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            font_size,
            color,
            align,
        });
    }

    fn centered_text(&mut self, text: &str, font_size: f32, color: Color) {
        let (x, y) = (self.render.width / 2.0, self.render.height / 2.0);
        self.text(text, x, y, font_size, color, TextAlign::Center);
    }

    fn draw_boundary(&mut self) {
        let origin = self.to_render(0.0, 0.0);
        let corner = self.to_render(self.config.world.width, self.config.world.height);
        self.frame.push(DrawCommand::RectOutline {
            x: origin.x,
            y: origin.y,
            w: corner.x - origin.x,
            h: corner.y - origin.y,
            thickness: BOUNDARY_THICKNESS,
            color: BOUNDARY,
        });
    }

    fn draw_player(&mut self, id: &str, player: &PlayerState) {
        let center = self.to_render(player.x, player.y);
        let radius = self.length(self.config.player_radius);

        let fill = if !player.is_alive() {
            DEAD_PLAYER
        } else if id == self.local_player_id {
            LOCAL_PLAYER
        } else {
            OTHER_PLAYER
        };
        self.frame.push(DrawCommand::Circle {
            x: center.x,
            y: center.y,
            radius,
            color: fill,
            outline: Some(OUTLINE),
        });

        self.text(id, center.x, center.y - radius - 5.0, NAME_FONT, LABEL, TextAlign::Center);

        if player.is_alive() {
            let bar_width = radius * 2.0;
            let bar_x = center.x - bar_width / 2.0;
            let bar_y = center.y + radius + 5.0;
            self.frame.push(DrawCommand::Rect {
                x: bar_x,
                y: bar_y,
                w: bar_width,
                h: HEALTH_BAR_HEIGHT,
                color: HEALTH_BACKGROUND,
            });
            self.frame.push(DrawCommand::Rect {
                x: bar_x,
                y: bar_y,
                w: bar_width * player.health_ratio(self.config.max_hp),
                h: HEALTH_BAR_HEIGHT,
                color: ALERT,
            });
            self.text(
                &player.hp.to_string(),
                center.x,
                center.y + radius + 15.0,
                SMALL_FONT,
                LABEL,
                TextAlign::Center,
            );
        } else {
            self.text(
                DEAD_LABEL,
                center.x,
                center.y + radius + 10.0,
                SMALL_FONT,
                ALERT,
                TextAlign::Center,
            );
        }

        if player.kills > 0 {
            self.text(
                &format!("Kills: {}", player.kills),
                center.x,
                center.y - radius - 15.0,
                SMALL_FONT,
                KILLS,
                TextAlign::Center,
            );
        }
    }

    /// The preview always reaches the maximum shot distance along the drag direction
    fn draw_aim_preview(&mut self, me: &PlayerState, pointer: Vec2, ready: bool) {
        let origin = Vec2::new(me.x, me.y);
        let target = coords::to_world(pointer, self.render, self.config.world);
        let Some(reach) = (target - origin).with_length(self.config.max_shoot_distance) else {
            return;
        };

        let start = self.to_render(origin.x, origin.y);
        let end_world = origin + reach;
        let end = self.to_render(end_world.x, end_world.y);
        self.frame.push(DrawCommand::Line {
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            thickness: self.length(self.config.aim_line_width),
            color: if ready { AIM_READY } else { AIM_COOLING },
        });
    }

    fn draw_bullet(&mut self, bullet: &BulletState) {
        let center = self.to_render(bullet.x, bullet.y);
        let color = if bullet.owner == self.local_player_id {
            LOCAL_BULLET
        } else {
            ALERT
        };
        self.frame.push(DrawCommand::Circle {
            x: center.x,
            y: center.y,
            radius: self.length(self.config.bullet_radius),
            color,
            outline: None,
        });
    }

    fn draw_local_overlay(&mut self, me: &PlayerState, ui: &LocalUiState) {
        if !ui.cooldown_remaining.is_zero() {
            let center = self.to_render(me.x, me.y);
            self.text(
                &format!("{:.1}", ui.cooldown_remaining.as_secs_f32()),
                center.x,
                center.y + 5.0,
                COOLDOWN_FONT,
                ALERT,
                TextAlign::Center,
            );
        }
        if !me.is_alive() {
            self.centered_text(DEATH_PROMPT, PROMPT_FONT, ALERT);
        }
    }

    fn draw_room_hud(&mut self, room: &RoomInfo) {
        let text = format!(
            "Room: {}  Players: {}/{}",
            room.name, room.players_count, room.max_players
        );
        self.text(&text, 10.0, 20.0, HUD_FONT, HUD_TEXT, TextAlign::Left);
    }
}

/// Draws a [`Frame`] with macroquad
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn surface_size(&self) -> Size {
        Size::new(screen_width(), screen_height())
    }

    pub fn present(&self, frame: &Frame) {
        for command in &frame.commands {
            match command {
                DrawCommand::Clear(color) => clear_background(*color),
                DrawCommand::Rect { x, y, w, h, color } => draw_rectangle(*x, *y, *w, *h, *color),
                DrawCommand::RectOutline {
                    x,
                    y,
                    w,
                    h,
                    thickness,
                    color,
                } => draw_rectangle_lines(*x, *y, *w, *h, *thickness, *color),
                DrawCommand::Circle {
                    x,
                    y,
                    radius,
                    color,
                    outline,
                } => {
                    draw_circle(*x, *y, *radius, *color);
                    if let Some(outline) = outline {
                        draw_circle_lines(*x, *y, *radius, 1.0, *outline);
                    }
                }
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    thickness,
                    color,
                } => draw_line(*x1, *y1, *x2, *y2, *thickness, *color),
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    font_size,
                    color,
                    align,
                } => {
                    let x = match align {
                        TextAlign::Left => *x,
                        TextAlign::Center => {
                            x - measure_text(text, None, *font_size as u16, 1.0).width / 2.0
                        }
                    };
                    draw_text(text, x, *y, *font_size, *color);
                }
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
