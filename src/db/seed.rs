//! The schools available out of the box. The Postgres migration inserts the
//! same list.

use crate::models::school::School;

pub const SCHOOLS: [(&str, &str); 8] = [
    ("Georgia Institute of Technology", "gatech.edu"),
    ("Georgia State University", "gsu.edu"),
    ("Emory University", "emory.edu"),
    ("University of Georgia", "uga.edu"),
    ("Kennesaw State University", "kennesaw.edu"),
    ("Massachusetts Institute of Technology", "mit.edu"),
    ("Stanford University", "stanford.edu"),
    ("University of California, Berkeley", "berkeley.edu"),
];

pub fn default_schools() -> Vec<School> {
    SCHOOLS
        .iter()
        .map(|(name, domain)| School::new(*name, *domain))
        .collect()
}
