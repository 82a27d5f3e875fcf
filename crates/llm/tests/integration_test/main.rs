mod answer;
mod helpers;
