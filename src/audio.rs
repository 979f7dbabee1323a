use std::io::Cursor;

/// Cries ship loud, play them quietly.
const CRY_VOLUME: f32 = 0.2;

pub fn play_cry(bytes: Vec<u8>) -> Result<(), String> {
    let cursor = Cursor::new(bytes);
    let (_stream, handle) = rodio::OutputStream::try_default().map_err(|err| err.to_string())?;
    let sink = rodio::Sink::try_new(&handle).map_err(|err| err.to_string())?;
    let source = rodio::Decoder::new(cursor).map_err(|err| err.to_string())?;
    sink.set_volume(CRY_VOLUME);
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
