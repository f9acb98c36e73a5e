mod multivalue;
