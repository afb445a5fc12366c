use clap::Parser;
use medialib::screen::backend::Backend;
use medialib::screen::headless::Headless;
use medialib::{Color, Rect, Session, SessionConfig};

const SCREEN_WIDTH: u32 = 800;
const SCREEN_HEIGHT: u32 = 600;

const BG_COLOR: Color = Color::rgb(0x00, 0x00, 0x7f);
const HL_COLOR: Color = Color::rgb(0xbf, 0xbf, 0xff);

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// image drawn next to the rectangles
    #[clap(short, long)]
    image: Option<String>,
    /// audio file played at start
    #[clap(short, long)]
    sound: Option<String>,
    /// TrueType or BDF font for the captions
    #[clap(short, long)]
    font: Option<String>,
    /// where to save a screenshot
    #[clap(long, default_value = "medialib.png")]
    screenshot: String,
    /// draw into memory only, without a window or audio
    #[clap(long)]
    headless: bool,
    /// skip opening an audio device
    #[clap(long)]
    no_audio: bool,
    /// leave log output to the caller
    #[clap(long)]
    no_log: bool,
}

fn demo<B: Backend>(s: &mut Session<B>, args: &Args) {
    if let Some(font) = &args.font {
        s.set_font(font);
    }

    s.clear(BG_COLOR);
    s.draw_rect(10, 10, 150, 250, None);
    s.draw_rect(300, 250, 250, 50, Color::rgb(0xbf, 0x00, 0x00));
    if let Some(image) = &args.image {
        s.draw_image(image, 180, 10, None);
        s.draw_image(image, 180, 150, (80, 60));
    }

    let caption = format!("font: {}", s.font_path());
    s.draw_text(&caption, 10, 280, 16, HL_COLOR);
    let (w, h) = s.measure_text("medialib", 48);
    s.draw_text(
        "medialib",
        SCREEN_WIDTH.saturating_sub(w) as i32 / 2,
        SCREEN_HEIGHT.saturating_sub(h) as i32 - 20,
        48,
        None,
    );

    if let Some(sound) = &args.sound {
        s.play_sound(sound);
    }

    s.save_screen(&args.screenshot, None);
    s.save_screen(
        &format!("region-{}", args.screenshot),
        Rect::new(10, 10, 600, 400),
    );
}

/// echo letters and mouse clicks until ESC or the window is closed
fn interact<B: Backend>(s: &mut Session<B>) {
    while !s.close_requested() && !s.is_key_pressed("\u{1b}") {
        for letter in 'a'..='z' {
            if s.is_key_pressed(letter.encode_utf8(&mut [0; 4])) {
                s.draw_rect(10, 340, 400, 30, BG_COLOR);
                s.draw_text(&format!("you pressed {letter}"), 10, 340, 20, HL_COLOR);
            }
        }
        if s.is_mouse_pressed() {
            let (x, y) = s.get_mouse_position();
            s.draw_rect(x - 2, y - 2, 5, 5, None);
        }
        s.wait(0.02);
    }
}

fn main() -> Result<(), medialib::Error> {
    let args = Args::parse();

    if args.headless {
        let mut s = Session::with_backend(Headless::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        demo(&mut s, &args);
        s.shutdown();
        return Ok(());
    }

    let config = SessionConfig::default()
        .with_title("medialib demo")
        .with_size(SCREEN_WIDTH, SCREEN_HEIGHT)
        .with_audio(!args.no_audio)
        .with_logger(!args.no_log);
    let mut s = Session::open(config)?;
    demo(&mut s, &args);

    s.draw_text("press a letter, ESC quits", 10, 310, 20, None);
    interact(&mut s);

    s.shutdown();
    Ok(())
}
