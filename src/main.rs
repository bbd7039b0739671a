//! Pig Slash entry point
//!
//! Wires DOM input and presentation to the sim on wasm; runs a scripted
//! headless demo on native.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    //! Browser driver.
    //!
    //! Expects the page to provide: `#gameArea` (the arena), `#trailSvg` /
    //! `#trailLine` (stroke trail), `#score`, `#missText`, `#timerText`
    //! (HUD), `#loadScreen`, `#startScreen` with `input[name="difficulty"]`
    //! radios, and `#btnStart`.

    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, HtmlInputElement, MouseEvent, TouchEvent};

    use pig_slash::consts::HIT_EFFECT_MS;
    use pig_slash::settings::{Difficulty, Settings};
    use pig_slash::sim::{self, Arena, GameEvent, GameState, Rect, StrokeSampler, Target, TargetId};

    const PIG_IMG_SRC: &str = "assets/pig_full.png";
    const HIT_EFFECT_SRC: &str = "assets/pig_blood.png";

    /// Game instance holding sim state and the DOM handles it drives
    struct Game {
        state: GameState,
        sampler: StrokeSampler,
        area: Element,
        pigs: HashMap<TargetId, Element>,
    }

    impl Game {
        fn new(seed: u64, area: Element) -> Self {
            let rect = area.get_bounding_client_rect();
            let arena = Arena {
                width: rect.width() as f32,
                height: rect.height() as f32,
            };
            Self {
                state: GameState::new(seed, arena),
                sampler: StrokeSampler::new(),
                area,
                pigs: HashMap::new(),
            }
        }

        /// Convert a client-space coordinate into the arena frame.
        fn to_arena(&self, client_x: f64, client_y: f64) -> Vec2 {
            let rect = self.area.get_bounding_client_rect();
            Vec2::new(
                (client_x - rect.left()) as f32,
                (client_y - rect.top()) as f32,
            )
        }

        /// Re-read the arena size (layout may have changed since load).
        fn sync_arena(&mut self) {
            let rect = self.area.get_bounding_client_rect();
            self.state.set_arena(Arena {
                width: rect.width() as f32,
                height: rect.height() as f32,
            });
        }

        /// Push each pig's current bounding box into the sim, then finalize
        /// the stroke and hand it to the round controller.
        fn end_slash(&mut self) {
            let arena = self.area.get_bounding_client_rect();
            let rects: Vec<(TargetId, Rect)> = self
                .pigs
                .iter()
                .map(|(id, el)| {
                    let r = el.get_bounding_client_rect();
                    (
                        *id,
                        Rect::new(
                            (r.left() - arena.left()) as f32,
                            (r.top() - arena.top()) as f32,
                            (r.right() - arena.left()) as f32,
                            (r.bottom() - arena.top()) as f32,
                        ),
                    )
                })
                .collect();
            for (id, rect) in rects {
                self.state.update_target_rect(id, rect);
            }

            if let Some(stroke) = self.sampler.finish() {
                sim::submit_stroke(&mut self.state, &stroke, js_sys::Date::now());
            }
            hide_trail(&document());
        }
    }

    fn document() -> Document {
        web_sys::window()
            .expect("no window")
            .document()
            .expect("no document")
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Draw the trail as a line from the stroke's first point to its latest.
    fn update_trail(document: &Document, points: &[Vec2]) {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return;
        };
        if let Some(line) = document.get_element_by_id("trailLine") {
            let _ = line.set_attribute("x1", &first.x.to_string());
            let _ = line.set_attribute("y1", &first.y.to_string());
            let _ = line.set_attribute("x2", &last.x.to_string());
            let _ = line.set_attribute("y2", &last.y.to_string());
        }
        if let Some(svg) = document.get_element_by_id("trailSvg") {
            let _ = svg.set_attribute("class", "");
        }
    }

    fn hide_trail(document: &Document) {
        if let Some(svg) = document.get_element_by_id("trailSvg") {
            let _ = svg.set_attribute("class", "hidden");
        }
    }

    /// Create a pig element at its spawn rect.
    fn place_pig(area: &Element, document: &Document, target: &Target) -> Element {
        let el = document.create_element("div").expect("create div");
        let _ = el.set_attribute("class", "pig-wrap");
        if let Some(html) = el.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("left", &format!("{}px", target.rect.left));
            let _ = style.set_property("top", &format!("{}px", target.rect.top));
            let _ = style.set_property("width", &format!("{}px", target.rect.width()));
            let _ = style.set_property("height", &format!("{}px", target.rect.height()));
        }
        let img = document.create_element("img").expect("create img");
        let _ = img.set_attribute("src", PIG_IMG_SRC);
        let _ = img.set_attribute("alt", "pig");
        let _ = img.set_attribute("class", "pig-img");
        let _ = el.append_child(&img);
        let _ = area.append_child(&el);
        el
    }

    /// Cosmetic splash at the victim's rect, removed after HIT_EFFECT_MS.
    fn spawn_hit_overlay(area: &Element, document: &Document, rect: &Rect) {
        let overlay = document.create_element("div").expect("create div");
        let _ = overlay.set_attribute("class", "hit-overlay");
        if let Some(html) = overlay.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("left", &format!("{}px", rect.left));
            let _ = style.set_property("top", &format!("{}px", rect.top));
            let _ = style.set_property("width", &format!("{}px", rect.width()));
            let _ = style.set_property("height", &format!("{}px", rect.height()));
            let _ = style.set_property("pointer-events", "none");
            let _ = style.set_property("z-index", "10");
        }
        let img = document.create_element("img").expect("create img");
        let _ = img.set_attribute("src", HIT_EFFECT_SRC);
        let _ = img.set_attribute("alt", "");
        let _ = overlay.append_child(&img);
        let _ = area.append_child(&overlay);

        let window = web_sys::window().expect("no window");
        let closure = Closure::once_into_js(move || {
            overlay.remove();
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.unchecked_ref(),
            HIT_EFFECT_MS,
        );
    }

    /// Apply drained sim events to the DOM.
    fn apply_events(game: &mut Game, events: &[GameEvent]) {
        let document = document();
        for event in events {
            match event {
                GameEvent::RoundStarted { targets } => {
                    for target in targets {
                        let el = place_pig(&game.area, &document, target);
                        game.pigs.insert(target.id, el);
                    }
                }
                GameEvent::TargetHit { id, rect } => {
                    if let Some(el) = game.pigs.get(id) {
                        if let Ok(Some(img)) = el.query_selector("img") {
                            let _ = img.set_attribute("src", HIT_EFFECT_SRC);
                        }
                    }
                    spawn_hit_overlay(&game.area, &document, rect);
                }
                GameEvent::ScoreChanged { score } => {
                    set_text(&document, "score", &score.to_string());
                }
                GameEvent::MissCountChanged { miss_count } => {
                    set_text(&document, "missText", &miss_count.to_string());
                }
                GameEvent::CountdownTick { remaining_ms } => {
                    set_text(&document, "timerText", &format!("{:.1}s", remaining_ms / 1000.0));
                }
                GameEvent::RoundResolved { .. } => {
                    for (_, el) in game.pigs.drain() {
                        el.remove();
                    }
                    set_text(&document, "timerText", "--");
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Pig Slash starting...");

        let document = document();
        let area = document.get_element_by_id("gameArea").expect("no gameArea");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, area.clone())));
        log::info!("Game initialized with seed: {}", seed);

        // Preselect the saved difficulty on the start screen
        let settings = Settings::load();
        let selector = format!(
            "input[name=\"difficulty\"][value=\"{}\"]",
            settings.difficulty.as_str()
        );
        if let Ok(Some(el)) = document.query_selector(&selector) {
            if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
                input.set_checked(true);
            }
        }

        setup_input_handlers(&area, game.clone());
        setup_start_button(game.clone());

        // Asset preloading is the page's concern; go straight to the
        // start screen.
        if let Some(el) = document.get_element_by_id("loadScreen") {
            let _ = el.set_attribute("class", "hidden");
        }
        if let Some(el) = document.get_element_by_id("startScreen") {
            let _ = el.set_attribute("class", "");
        }

        request_animation_frame(game);

        log::info!("Pig Slash running!");
    }

    fn setup_input_handlers(area: &Element, game: Rc<RefCell<Game>>) {
        // Mouse down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let p = g.to_arena(f64::from(event.client_x()), f64::from(event.client_y()));
                g.sampler.begin(p, js_sys::Date::now());
                update_trail(&document(), g.sampler.points());
            });
            let _ = area
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if !g.sampler.dragging() {
                    return;
                }
                let p = g.to_arena(f64::from(event.client_x()), f64::from(event.client_y()));
                g.sampler.sample(p, js_sys::Date::now());
                update_trail(&document(), g.sampler.points());
            });
            let _ = area
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                game.borrow_mut().end_slash();
            });
            let _ =
                area.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Leaving the arena ends the slash like a release
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.sampler.dragging() {
                    g.end_slash();
                }
            });
            let _ = area
                .add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - only the first concurrent touch is tracked
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if event.touches().length() != 1 {
                    return;
                }
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut g = game.borrow_mut();
                    let p = g.to_arena(f64::from(touch.client_x()), f64::from(touch.client_y()));
                    g.sampler.begin(p, js_sys::Date::now());
                    update_trail(&document(), g.sampler.points());
                }
            });
            let _ = area
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if event.touches().length() != 1 {
                    return;
                }
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut g = game.borrow_mut();
                    if !g.sampler.dragging() {
                        return;
                    }
                    let p = g.to_arena(f64::from(touch.client_x()), f64::from(touch.client_y()));
                    g.sampler.sample(p, js_sys::Date::now());
                    update_trail(&document(), g.sampler.points());
                }
            });
            let _ = area
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end / cancel both finalize once the last finger lifts
        for event_name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if event.touches().length() == 0 {
                    game.borrow_mut().end_slash();
                }
            });
            let _ =
                area.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) {
        if let Some(btn) = document().get_element_by_id("btnStart") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let doc = document();
                let mut difficulty = Settings::load().difficulty;
                if let Ok(Some(el)) = doc.query_selector("input[name=\"difficulty\"]:checked") {
                    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
                        if let Some(tier) = Difficulty::from_str(&input.value()) {
                            difficulty = tier;
                        }
                    }
                }
                Settings { difficulty }.save();

                if let Some(el) = doc.get_element_by_id("startScreen") {
                    let _ = el.set_attribute("class", "hidden");
                }

                let mut g = game.borrow_mut();
                g.sync_arena();
                sim::start_session(&mut g.state, difficulty, js_sys::Date::now());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, _time: f64) {
        {
            let mut g = game.borrow_mut();
            sim::tick(&mut g.state, js_sys::Date::now());
            let events = g.state.drain_events();
            if !events.is_empty() {
                apply_events(&mut g, &events);
            }
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pig Slash (native) starting...");
    log::info!("Native mode is headless - serve the web build to play; running a scripted demo");
    demo_session();
}

/// Drive a few rounds without a browser: slash every pig through its center.
#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use glam::Vec2;
    use pig_slash::settings::Difficulty;
    use pig_slash::sim::{self, Arena, GameState};

    let mut state = GameState::new(
        0xBACC0,
        Arena {
            width: 800.0,
            height: 600.0,
        },
    );
    sim::start_session(&mut state, Difficulty::Medium, 0.0);

    let mut now = 0.0;
    for round_no in 1..=5 {
        let centers: Vec<Vec2> = state
            .round
            .as_ref()
            .map(|r| r.targets.iter().map(|t| t.rect.center()).collect())
            .unwrap_or_default();
        for center in centers {
            now += 100.0;
            sim::tick(&mut state, now);
            let stroke = [center - Vec2::splat(10.0), center + Vec2::splat(10.0)];
            sim::submit_stroke(&mut state, &stroke, now);
        }
        log::info!("round {round_no} cleared, score={}", state.session.score);

        // Let the settle delay pass so the next round spawns
        now += 60.0;
        sim::tick(&mut state, now);
        state.drain_events();
    }

    println!(
        "demo finished: score={} misses={}",
        state.session.score, state.session.miss_count
    );
}
