use std::io::{Read, Write};
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::{MovieId, Rating, UserId};

pub type RatingTriple = (UserId, MovieId, Rating);

pub const SUBMISSION_HEADER: [&str; 2] = ["Id", "rating"];

#[derive(Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: Rating,
}

#[derive(Deserialize)]
struct SubmissionRow {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Serialize)]
struct PredictionRow<'a> {
    id: &'a str,
    rating: Rating,
}

/// Reads `userId,movieId,rating` triples from a headed csv; other columns are ignored.
pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<RatingTriple>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader)
        .deserialize()
        .map(|result| result.map(|row: RatingRow| (row.user_id, row.movie_id, row.rating)))
        .collect()
}

pub fn read_ratings_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RatingTriple>, csv::Error> {
    let file = std::fs::File::open(path)?;
    read_ratings(std::io::BufReader::new(file))
}

/// Reads the raw `Id` column of a submission file, in file order.
pub fn read_submission_ids<R: Read>(reader: R) -> Result<Vec<String>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader)
        .deserialize()
        .map(|result| result.map(|row: SubmissionRow| row.id))
        .collect()
}

pub fn read_submission_ids_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<String>, csv::Error> {
    let file = std::fs::File::open(path)?;
    read_submission_ids(std::io::BufReader::new(file))
}

/// Writes an `Id,rating` table. The header is written even for an empty batch.
pub fn write_predictions<W, I, S>(writer: W, rows: I) -> Result<usize, csv::Error>
where
    W: Write,
    I: IntoIterator<Item = (S, Rating)>,
    S: AsRef<str>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(SUBMISSION_HEADER)?;
    let mut qty_rows = 0;
    for (id, rating) in rows {
        csv_writer.serialize(PredictionRow {
            id: id.as_ref(),
            rating,
        })?;
        qty_rows += 1;
    }
    csv_writer.flush()?;
    Ok(qty_rows)
}
