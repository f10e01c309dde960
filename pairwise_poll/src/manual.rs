/*!

This is the long-form manual for `pairwise_poll` and `coasterpoll`.

## How the poll is counted

Every ballot ranks some of the candidates of the master list: `1` is the
favorite, a higher number is less preferred, and several candidates may share
the same number. A candidate ranked `0`, or not listed at all, was not ridden
by the voter and plays no part in that ballot.

Each ballot is split into head-to-head contests: for every two candidates ranked
on the ballot, the one with the lower number wins the contest, and equal
numbers make a tie. Contests are summed over all the valid ballots.

Two percentages are computed for each candidate, a tie counting as half a win:
* the _total win percentage_, over all its contests against all opponents. This
  orders the final ranking.
* the _pairwise win percentage_, where each opponent met counts once: won if the
  candidate won more contests than it lost against that opponent.

Candidates with fewer riders than `minRiders` are left out of the ranking and
listed separately. Candidates with equal percentages share the same rank
(`1, 2, 2, 4`).

## Master list

A text file. Everything up to the line

```text
! DO NOT CHANGE OR DELETE THIS LINE !
```

is a free-form header. Each following line describes one candidate:

```text
0, Millennium Force - Cedar Point - Sandusky Ohio USA, MilFor, Intamin, 2000, https://rcdb.com/1.htm
```

The columns are: a rank (ignored), the key of the candidate, an abbreviation
used in the exports, and optionally the designer, the year and a link. Keys of
the form `name - park - location` are split into their parts in the exports.

Blank lines and lines starting with `* ` are skipped in every input file.

## Ballots

The ballot directory is read in file name order. The extension of each file
selects its format; other files are ignored.

### `.txt`

A copy of the master list filled in by the voter. Before the sentinel line, up
to five lines give the name, email, city, state or province and country of the
voter. A line still starting with `-Replace` means no answer. After the sentinel
line, each line is `rank, key`; extra columns are ignored.

### `.csv`

Two columns `rank,key`, one candidate per row. A first row whose rank is not a
number and whose key is not in the master list is taken as a header. There is
no voter information. A file that cannot be decoded, for example with invalid
UTF-8, is rejected like any other bad ballot.

### `.xlsx`

The first sheet of the workbook, with the rank in the first column and the key
in the second. Numeric cells are read as integers. The header rule is the same
as for `.csv`. A file that is not a valid workbook is rejected.

## Rejected ballots

A ballot is discarded as a whole, and reported, if any of its rows:
* has a rank that is not a non-negative integer,
* names a candidate that is not in the master list,
* has no candidate column,
* names a candidate already ranked on the same ballot.

A text ballot without the sentinel line is also discarded. Rejected ballots are
logged with the line of the first problem and listed in the summary.

## Configuration

The `coasterpoll` program reads a JSON configuration file:

```json
{
  "outputSettings": {
    "pollName": "Steel coaster poll",
    "pollYear": "2023",
    "outputPath": "results.json"
  },
  "masterListPath": "blankballot.txt",
  "ballotDirectory": "ballots",
  "minRiders": 10,
  "includeVoterInfo": false
}
```

Relative paths are resolved from the directory of the configuration file. The
command line options take precedence over the file.

*/
