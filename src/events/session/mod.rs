pub mod lyrics_line;
pub mod player_destroy;
pub mod queue_end;
pub mod track_end;
pub mod track_start;
