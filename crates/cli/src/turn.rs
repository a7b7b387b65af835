//! Runs one turn from request to finished bubble.

use std::io::Write;

use tutor_session::{
    CONCEPT_MAP_LABEL, SessionController, TurnKind, TurnOptions, TurnOutcome,
};

use crate::screen::ChatScreen;

/// A turn the student (or the session opening) asks for.
#[derive(Debug, Clone, Copy)]
pub enum TurnRequest<'a> {
    /// The tutor's first message
    Opening,
    Message(&'a str),
    ConceptMap,
}

/// Start a turn on `controller` and stream it into `screen`.
///
/// Returns `None` when the turn could not start. The error has already been
/// shown by then.
pub async fn drive_turn<W: Write + Send>(
    controller: &mut SessionController,
    screen: &mut ChatScreen<W>,
    request: TurnRequest<'_>,
) -> Option<TurnOutcome> {
    let consumer = controller.consumer();

    let (kind, id, started) = match request {
        TurnRequest::Opening => {
            let id = screen.begin_ai_turn();
            (TurnKind::Opening, id, controller.start_initial_turn().await)
        }
        TurnRequest::Message(text) => {
            let image = screen.take_attachment();
            let options = TurnOptions::new(screen.mode()).with_image(image.clone());
            let id = screen.begin_user_turn(text, image);
            (TurnKind::Regular, id, controller.send_turn(text, options).await)
        }
        TurnRequest::ConceptMap => {
            let image = screen.take_attachment();
            let options = TurnOptions::new(screen.mode()).with_image(image.clone());
            let id = screen.begin_user_turn(CONCEPT_MAP_LABEL, image);
            (TurnKind::Regular, id, controller.send_concept_map(options).await)
        }
    };

    match started {
        Ok(stream) => {
            tracing::debug!(profile = %stream.profile(), model = stream.model(), "Turn started");
            let outcome = consumer.consume(id, stream, kind, screen).await;
            screen.finish_turn(id);
            Some(outcome)
        }
        Err(e) => {
            consumer.report(id, kind, e, screen);
            screen.finish_turn(id);
            None
        }
    }
}
