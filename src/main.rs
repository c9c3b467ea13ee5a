//! Void Scrapper entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlSelectElement, KeyboardEvent,
        MouseEvent, TouchEvent,
    };

    use void_scrapper::anomaly::{AnomalyEvent, LocalOracle, resolve_anomaly};
    use void_scrapper::game::AnomalyStage;
    use void_scrapper::platform::InputState;
    use void_scrapper::sim::{GameEvent, GamePhase};
    use void_scrapper::{Game, QualityPreset, Settings, direction};

    /// Browser-side game instance
    struct WebGame {
        game: Game,
        input: InputState,
        ctx: CanvasRenderingContext2d,
        oracle: Option<Rc<LocalOracle>>,
        /// Anomaly overlay currently built for the pending event
        overlay_shown: bool,
    }

    impl WebGame {
        /// Handle one animation frame
        fn frame(game: &Rc<RefCell<WebGame>>, time: f64) {
            let request = {
                let mut g = game.borrow_mut();
                let input = g.input.snapshot();
                g.game.frame(&input, time)
            };

            if let Some(request) = request {
                let oracle = game.borrow().oracle.clone();
                let game = game.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let event = match oracle {
                        Some(oracle) => resolve_anomaly(oracle.as_ref(), request).await,
                        None => AnomalyEvent::fallback(),
                    };
                    game.borrow_mut().game.deliver_anomaly(request.id, event);
                });
            }

            let mut g = game.borrow_mut();
            for event in g.game.drain_events() {
                if let GameEvent::PhaseChanged { from, to } = event {
                    log::info!("Phase {:?} -> {:?}", from, to);
                }
            }
            g.draw();
            drop(g);
            update_hud(game);
        }

        /// Debug draw of every entity as a filled circle
        fn draw(&self) {
            let state = self.game.state();
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#05060a");
            ctx.fill_rect(0.0, 0.0, state.bounds.x as f64, state.bounds.y as f64);

            for e in state.entities.iter().chain(std::iter::once(&state.player)) {
                ctx.set_fill_style_str(e.color.css());
                ctx.begin_path();
                let _ = ctx.arc(
                    e.pos.x as f64,
                    e.pos.y as f64,
                    e.radius.max(0.5) as f64,
                    0.0,
                    std::f64::consts::TAU,
                );
                ctx.fill();
            }

            // Ship nose
            let p = &state.player;
            let nose = p.pos + direction(p.rotation) * p.radius * 1.6;
            ctx.set_stroke_style_str(p.color.css());
            ctx.set_line_width(3.0);
            ctx.begin_path();
            ctx.move_to(p.pos.x as f64, p.pos.y as f64);
            ctx.line_to(nose.x as f64, nose.y as f64);
            ctx.stroke();

            if self.game.settings().show_touch_controls {
                ctx.set_stroke_style_str("rgba(255,255,255,0.3)");
                if let Some(t) = self.input.move_touch() {
                    draw_stick(ctx, self.input.move_center(), t.pos);
                }
                if let Some(t) = self.input.aim_touch() {
                    draw_stick(ctx, self.input.aim_center(), t.pos);
                }
            }
        }
    }

    fn draw_stick(ctx: &CanvasRenderingContext2d, center: Vec2, touch: Vec2) {
        ctx.begin_path();
        let _ = ctx.arc(center.x as f64, center.y as f64, 50.0, 0.0, std::f64::consts::TAU);
        ctx.stroke();
        ctx.begin_path();
        let _ = ctx.arc(touch.x as f64, touch.y as f64, 20.0, 0.0, std::f64::consts::TAU);
        ctx.stroke();
    }

    fn get_document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Update HUD elements and overlays in the DOM
    fn update_hud(game: &Rc<RefCell<WebGame>>) {
        let Some(document) = get_document() else {
            return;
        };
        let (stats, phase) = {
            let g = game.borrow();
            (g.game.stats(), g.game.phase())
        };

        set_text(
            &document,
            "hud-health",
            &format!("{:.0}/{:.0}", stats.health, stats.max_health),
        );
        set_text(&document, "hud-scrap", &stats.scrap.to_string());
        set_text(&document, "hud-score", &stats.score.to_string());
        set_text(&document, "hud-level", &stats.level.to_string());

        set_visible(&document, "loading", phase == GamePhase::Loading);
        set_visible(&document, "game-over", phase == GamePhase::GameOver);
        if phase == GamePhase::GameOver {
            set_text(&document, "final-score", &stats.score.to_string());
        }

        set_visible(&document, "anomaly", phase == GamePhase::Anomaly);
        let (pending, awaiting) = {
            let g = game.borrow();
            let awaiting = matches!(g.game.anomaly_stage(), AnomalyStage::Awaiting { .. });
            if g.overlay_shown {
                (None, awaiting)
            } else {
                (g.game.pending_anomaly().cloned(), awaiting)
            }
        };
        if awaiting {
            set_text(&document, "anomaly-title", "Decoding signal...");
            set_text(&document, "anomaly-description", "");
            if let Some(list) = document.get_element_by_id("anomaly-options") {
                list.set_inner_html("");
            }
        }
        if let Some(event) = pending {
            build_anomaly_overlay(&document, game, &event);
            game.borrow_mut().overlay_shown = true;
        } else if phase != GamePhase::Anomaly {
            game.borrow_mut().overlay_shown = false;
        }
    }

    fn build_anomaly_overlay(document: &Document, game: &Rc<RefCell<WebGame>>, event: &AnomalyEvent) {
        set_text(document, "anomaly-title", &event.title);
        set_text(document, "anomaly-description", &event.description);
        set_text(document, "anomaly-outcome", "");
        let Some(list) = document.get_element_by_id("anomaly-options") else {
            return;
        };
        list.set_inner_html("");

        for (index, option) in event.options.iter().enumerate() {
            let Ok(button) = document.create_element("button") else {
                continue;
            };
            button.set_text_content(Some(&option.text));
            let game = game.clone();
            let outcome = option.outcome_description.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                match game.borrow_mut().game.choose_option(index) {
                    Ok(_) => {
                        if let Some(document) = get_document() {
                            set_text(&document, "anomaly-outcome", &outcome);
                        }
                    }
                    Err(e) => log::warn!("Anomaly choice rejected: {}", e),
                }
            });
            let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
            let _ = list.append_child(&button);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Void Scrapper starting...");

        let Some(document) = get_document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2D context unavailable");
            return;
        };

        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let bounds = Vec2::new(width as f32, height as f32);

        let seed = js_sys::Date::now() as u64;
        let oracle = match LocalOracle::new(seed) {
            Ok(oracle) => Some(Rc::new(oracle)),
            Err(e) => {
                log::warn!("Anomaly catalog unavailable, using fallback events: {}", e);
                None
            }
        };
        let game = Rc::new(RefCell::new(WebGame {
            game: Game::new(seed, bounds, Settings::load()),
            input: InputState::new(bounds),
            ctx,
            oracle,
            overlay_shown: false,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_resize_handler(&canvas, game.clone());
        setup_quality_control(game.clone());
        setup_restart_button(game.clone());

        request_animation_frame(game);

        log::info!("Void Scrapper running!");
    }

    fn canvas_pos(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            client_x as f32 - rect.left() as f32,
            client_y as f32 - rect.top() as f32,
        )
    }

    fn for_each_changed_touch(event: &TouchEvent, mut f: impl FnMut(i32, i32, i32)) {
        let touches = event.changed_touches();
        for i in 0..touches.length() {
            if let Some(touch) = touches.get(i) {
                f(touch.identifier(), touch.client_x(), touch.client_y());
            }
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().input.key_down(&event.key()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur releases held controls
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().input.pointer_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.pointer_down();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.pointer_up();
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch sticks
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                for_each_changed_touch(&event, |id, x, y| {
                    g.input.touch_start(id, canvas_pos(&canvas_clone, x, y));
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                for_each_changed_touch(&event, |id, x, y| {
                    g.input.touch_move(id, canvas_pos(&canvas_clone, x, y));
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                for_each_changed_touch(&event, |id, _, _| g.input.touch_end(id));
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Match the backing store and play area to the canvas's CSS size
    fn setup_resize_handler(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let width = canvas.client_width().max(1) as u32;
            let height = canvas.client_height().max(1) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            let bounds = Vec2::new(width as f32, height as f32);
            let mut g = game.borrow_mut();
            g.game.set_bounds(bounds);
            g.input.set_viewport(bounds);
            log::info!("Resized to {}x{}", width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Quality dropdown; changes are applied at once and persisted
    fn setup_quality_control(game: Rc<RefCell<WebGame>>) {
        let Some(select) = get_document()
            .and_then(|d| d.get_element_by_id("quality"))
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };
        select.set_value(game.borrow().game.settings().quality.as_str());

        let select_clone = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(quality) = QualityPreset::parse(&select_clone.value()) else {
                log::warn!("Unknown quality preset: {}", select_clone.value());
                return;
            };
            let mut g = game.borrow_mut();
            let settings = Settings {
                quality,
                ..g.game.settings().clone()
            };
            settings.save();
            g.game.apply_settings(settings);
            log::info!("Quality set to {}", quality.as_str());
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_restart_button(game: Rc<RefCell<WebGame>>) {
        let Some(document) = get_document() else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                match g.game.restart() {
                    Ok(()) => {
                        g.input.clear();
                        g.overlay_shown = false;
                    }
                    Err(e) => log::warn!("{}", e),
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<WebGame>>, time: f64) {
        WebGame::frame(&game, time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{SystemTime, UNIX_EPOCH};

    use glam::Vec2;

    use void_scrapper::anomaly::{AnomalyEffect, AnomalyEvent, LocalOracle, resolve_anomaly};
    use void_scrapper::platform::InputState;
    use void_scrapper::sim::{Entity, EntityKind, GameEvent, GamePhase, GameState};
    use void_scrapper::{Game, QualityPreset, Settings, distance};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Three minutes of play
    const MAX_FRAMES: u32 = 60 * 180;
    /// Enemies closer than this make the autopilot back off
    const DANGER_RADIUS: f32 = 180.0;

    /// Point the autopilot wants to move toward
    fn steer(state: &GameState) -> Vec2 {
        let player = state.player.pos;
        let nearest = |pred: fn(&Entity) -> bool| {
            state
                .entities
                .iter()
                .filter(|&e| pred(e))
                .min_by(|a, b| distance(a.pos, player).total_cmp(&distance(b.pos, player)))
        };

        if let Some(enemy) = nearest(Entity::is_enemy) {
            if distance(enemy.pos, player) < DANGER_RADIUS {
                return player + (player - enemy.pos);
            }
        }
        let wants_health = state.player.health < state.player.max_health * 0.6;
        let pickup = nearest(|e| {
            e.is_scrap() || e.is_anomaly_core() || matches!(e.kind, EntityKind::HealthPickup(_))
        });
        if let Some(target) = pickup {
            if wants_health || !matches!(target.kind, EntityKind::HealthPickup(_)) {
                return target.pos;
            }
        }
        state.bounds * 0.5
    }

    /// Feed the autopilot's intent through the same input surface a player uses
    fn drive(input: &mut InputState, state: &GameState) {
        let player = state.player.pos;
        let target = steer(state);
        let delta = target - player;
        let press = |input: &mut InputState, key: &str, on: bool| {
            if on {
                input.key_down(key);
            } else {
                input.key_up(key);
            }
        };
        press(input, "a", delta.x < -8.0);
        press(input, "d", delta.x > 8.0);
        press(input, "w", delta.y < -8.0);
        press(input, "s", delta.y > 8.0);

        let aim = state
            .entities
            .iter()
            .filter(|e| e.is_enemy())
            .min_by(|a, b| distance(a.pos, player).total_cmp(&distance(b.pos, player)));
        match aim {
            Some(enemy) => {
                input.pointer_move(enemy.pos);
                input.pointer_down();
            }
            None => input.pointer_up(),
        }
    }

    /// Pick the option that helps most right now
    fn choose(event: &AnomalyEvent, health_ratio: f32) -> usize {
        let score = |effect: AnomalyEffect, value: f32| match effect {
            AnomalyEffect::Heal if health_ratio < 0.7 => value * 2.0,
            AnomalyEffect::Heal => value * 0.5,
            AnomalyEffect::Scrap => value,
            AnomalyEffect::Damage => -value * 3.0,
            AnomalyEffect::Weapon | AnomalyEffect::Nothing => 0.0,
        };
        event
            .options
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| score(a.effect, a.value).total_cmp(&score(b.effect, b.value)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn run() {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let bounds = Vec2::new(1280.0, 720.0);
        let mut settings = Settings::load();
        if let Ok(name) = std::env::var("VOID_SCRAPPER_QUALITY") {
            match QualityPreset::parse(&name) {
                Some(quality) => settings.quality = quality,
                None => log::warn!("Unknown quality preset {:?}, keeping {}", name, settings.quality.as_str()),
            }
        }
        log::info!("Quality: {}", settings.quality.as_str());
        let mut game = Game::new(seed, bounds, settings);
        let mut input = InputState::new(bounds);
        let oracle = match LocalOracle::new(seed) {
            Ok(oracle) => Some(oracle),
            Err(e) => {
                log::warn!("Anomaly catalog unavailable, using fallback events: {}", e);
                None
            }
        };

        let mut kills = 0u32;
        let mut anomalies = 0u32;
        let mut now = 0.0;
        for _ in 0..MAX_FRAMES {
            drive(&mut input, game.state());
            if let Some(request) = game.frame(&input.snapshot(), now) {
                let event = match &oracle {
                    Some(oracle) => pollster::block_on(resolve_anomaly(oracle, request)),
                    None => AnomalyEvent::fallback(),
                };
                let stats = game.stats();
                let pick = choose(&event, stats.health / stats.max_health);
                log::info!("Anomaly \"{}\" -> {}", event.title, event.options[pick].text);
                game.deliver_anomaly(request.id, event);
                match game.choose_option(pick) {
                    Ok(option) => log::info!("{}", option.outcome_description),
                    Err(e) => log::warn!("Anomaly choice rejected: {}", e),
                }
                anomalies += 1;
            }

            for event in game.drain_events() {
                match event {
                    GameEvent::EnemyDestroyed { .. } => kills += 1,
                    GameEvent::PhaseChanged { to, .. } => log::info!("Phase -> {:?}", to),
                    _ => {}
                }
            }
            if game.phase() == GamePhase::GameOver {
                break;
            }
            now += FRAME_MS;
        }

        let stats = game.stats();
        log::info!(
            "Run ended after {:.1}s: score {}, level {}, scrap {}, kills {}, anomalies {}, health {:.0}",
            now / 1000.0,
            stats.score,
            stats.level,
            stats.scrap,
            kills,
            anomalies,
            stats.health
        );
        println!(
            "score={} level={} scrap={} kills={} anomalies={} survived={}",
            stats.score,
            stats.level,
            stats.scrap,
            kills,
            anomalies,
            game.phase() != GamePhase::GameOver
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Void Scrapper (native) starting...");
    log::info!("Native mode runs a headless autopilot - run with `trunk serve` for the web version");
    headless::run();
}
